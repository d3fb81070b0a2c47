//! Reversible checklist edits.
//!
//! # Responsibility
//! - Capture the minimal data needed to replay or revert one user action.
//! - Re-apply edits through the editor in replay mode only.
//!
//! # Invariants
//! - Changes reference items by id; `position` fields only mark where an
//!   item is (re)inserted.
//! - Deleted subtrees are stored as full snapshots.

use crate::config::ParentDeleteMode;
use crate::history::change_history::Change;
use crate::list::nested_list::ListError;
use crate::model::list_item::{ListItem, ListItemId};
use crate::service::list_editor::{ListEditor, Recording};
use std::fmt::{Display, Formatter};

/// One user-facing checklist edit.
///
/// `prior_order` holds the group order from just before the edit re-sorted
/// the list, `None` when sorting changed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange {
    /// Item (with any children it carried) inserted at `position`.
    Add {
        position: usize,
        item: ListItem,
        prior_order: Option<Vec<ListItemId>>,
    },
    /// Item removed from `position`; `item` holds its children as they were.
    Delete {
        position: usize,
        item: ListItem,
        mode: ParentDeleteMode,
        prior_order: Option<Vec<ListItemId>>,
    },
    /// Body text replaced.
    EditBody {
        id: ListItemId,
        before: String,
        after: String,
    },
    /// Checkbox of the item at `from` set to `checked`.
    ToggleChecked {
        id: ListItemId,
        from: usize,
        checked: bool,
        prior_order: Option<Vec<ListItemId>>,
    },
    /// Item demoted to a child (`is_child == true`) or promoted to a parent.
    Reparent {
        id: ListItemId,
        is_child: bool,
        prior_order: Option<Vec<ListItemId>>,
    },
    /// Item (with its children when a parent) moved between indices.
    Move {
        id: ListItemId,
        from: usize,
        to: usize,
        prior_order: Option<Vec<ListItemId>>,
    },
}

impl Display for ListChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add { position, item, .. } => {
                write!(f, "Add item {} at position: {position}", item.id)
            }
            Self::Delete { position, item, .. } => {
                write!(f, "Delete item {} at position: {position}", item.id)
            }
            Self::EditBody { id, .. } => write!(f, "Edit body of item {id}"),
            Self::ToggleChecked {
                id, from, checked, ..
            } => {
                let action = if *checked { "Check" } else { "Uncheck" };
                write!(f, "{action} item {id} at position: {from}")
            }
            Self::Reparent { id, is_child, .. } => {
                let action = if *is_child { "Indent" } else { "Outdent" };
                write!(f, "{action} item {id}")
            }
            Self::Move { id, from, to, .. } => write!(f, "Move item {id} from {from} to {to}"),
        }
    }
}

impl Change for ListChange {
    type Target = ListEditor;
    type Error = ListError;

    fn redo(&self, editor: &mut ListEditor) -> Result<(), ListError> {
        match self {
            Self::Add { position, item, .. } => editor
                .add(*position, item.clone(), Recording::Replay)
                .map(|_| ()),
            Self::Delete { item, mode, .. } => editor
                .delete(item.id, *mode, Recording::Replay)
                .map(|_| ()),
            Self::EditBody { id, after, .. } => editor
                .set_body(*id, after.clone(), Recording::Replay)
                .map(|_| ()),
            Self::ToggleChecked { id, checked, .. } => editor
                .set_checked(*id, *checked, Recording::Replay)
                .map(|_| ()),
            Self::Reparent { id, is_child, .. } => editor
                .set_is_child(*id, *is_child, Recording::Replay)
                .map(|_| ()),
            Self::Move { id, to, .. } => editor
                .move_item(*id, *to, Recording::Replay)
                .map(|_| ()),
        }
    }

    // Groups go back to their unsorted order before the structural inverse runs.
    fn undo(&self, editor: &mut ListEditor) -> Result<(), ListError> {
        match self {
            Self::Add {
                item, prior_order, ..
            } => {
                editor.restore_order(prior_order.as_deref())?;
                let children = item
                    .children
                    .iter()
                    .map(|child| child.id)
                    .collect::<Vec<_>>();
                editor.delete_by_id(item.id, &children).map(|_| ())
            }
            Self::Delete {
                position,
                item,
                mode,
                prior_order,
            } => {
                editor.restore_order(prior_order.as_deref())?;
                editor.restore_deleted(*position, item.clone(), *mode)
            }
            Self::EditBody { id, before, .. } => editor
                .set_body(*id, before.clone(), Recording::Replay)
                .map(|_| ()),
            Self::ToggleChecked {
                id,
                checked,
                prior_order,
                ..
            } => editor.restore_checked(*id, !*checked, prior_order.as_deref()),
            Self::Reparent {
                id,
                is_child,
                prior_order,
            } => {
                editor.restore_order(prior_order.as_deref())?;
                editor
                    .set_is_child(*id, !*is_child, Recording::Replay)
                    .map(|_| ())
            }
            Self::Move {
                id,
                from,
                prior_order,
                ..
            } => {
                editor.restore_order(prior_order.as_deref())?;
                editor
                    .move_item(*id, *from, Recording::Replay)
                    .map(|_| ())
            }
        }
    }
}
