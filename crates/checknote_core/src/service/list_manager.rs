//! Checklist editing use-case facade.
//!
//! # Responsibility
//! - Translate editing-surface gestures into list mutations.
//! - Record exactly one change per effective user action.
//! - Drive undo/redo and expose history availability.
//!
//! # Invariants
//! - No-op gestures record nothing.
//! - Exhausted history is reported as `Ok(false)`, never as an error.
//! - Structural errors propagate unchanged.

use crate::config::ListManagerConfig;
use crate::export::display_body;
use crate::history::change_history::{ChangeHistory, HistoryError, HistoryState};
use crate::list::nested_list::{ListError, ListResult, SortPolicy};
use crate::model::list_item::{ListItem, ListItemId};
use crate::service::list_change::ListChange;
use crate::service::list_editor::{ListEditor, ListEvent, Recording};
use log::{debug, warn};

/// Editing session over one checklist document.
#[derive(Debug)]
pub struct ListManager {
    editor: ListEditor,
    history: ChangeHistory<ListChange>,
}

impl Default for ListManager {
    fn default() -> Self {
        Self::new(ListManagerConfig::default())
    }
}

impl ListManager {
    /// Creates a session with an empty checklist.
    pub fn new(config: ListManagerConfig) -> Self {
        Self {
            editor: ListEditor::new(config),
            history: ChangeHistory::new(),
        }
    }

    /// Creates a session from a persisted snapshot.
    pub fn with_items(items: Vec<ListItem>, config: ListManagerConfig) -> ListResult<Self> {
        let mut manager = Self::new(config);
        manager.install(items)?;
        Ok(manager)
    }

    /// Replaces the checklist and clears history (document switch).
    pub fn install(&mut self, items: Vec<ListItem>) -> ListResult<()> {
        self.editor.install(items)?;
        self.history.reset();
        Ok(())
    }

    /// Registers the editing-surface callback for index range updates.
    pub fn set_listener(&mut self, listener: impl FnMut(&ListEvent) + 'static) {
        self.editor.set_listener(listener);
    }

    /// Registers the callback for undo/redo availability.
    pub fn set_history_listener(&mut self, listener: impl FnMut(HistoryState) + 'static) {
        self.history.set_listener(listener);
    }

    pub fn config(&self) -> ListManagerConfig {
        self.editor.config()
    }

    /// Switches sort policy; not recorded in history.
    pub fn set_sort_policy(&mut self, policy: SortPolicy) {
        self.editor.set_sort_policy(policy);
    }

    pub fn len(&self) -> usize {
        self.editor.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.editor.list().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ListItem> {
        self.editor.list().get(index)
    }

    pub fn position_of(&self, id: ListItemId) -> Option<usize> {
        self.editor.list().position_of(id)
    }

    /// Materializes the current checklist for persistence.
    pub fn items(&self) -> Vec<ListItem> {
        self.editor.list().items()
    }

    /// Plain-text rendering with checkboxes and child indentation.
    pub fn display_body(&self) -> String {
        display_body(&self.items())
    }

    pub fn history(&self) -> &ChangeHistory<ListChange> {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Creates a detached item with a fresh id, for callers that insert
    /// prepared content via [`ListManager::add`].
    pub fn create_item(&mut self, body: impl Into<String>) -> ListResult<ListItem> {
        Ok(ListItem::new(self.editor.allocate_id()?, body))
    }

    /// Inserts `item`, or a new empty item, at `position`.
    ///
    /// A new item is a child when it lands inside or right after a child run.
    /// Returns the final index, which differs from `position` when
    /// `CheckedFirst` sorting moved the item's group.
    pub fn add(&mut self, position: usize, item: Option<ListItem>) -> ListResult<usize> {
        let item = match item {
            Some(item) => item,
            None => {
                let is_child = self.neighbour_is_child(position);
                let mut item = self.create_item("")?;
                item.is_child = is_child;
                item
            }
        };
        let edit = self.editor.add(position, item, Recording::Record)?;
        self.record(edit.change);
        Ok(edit.value)
    }

    /// Deletes the item at `index`.
    ///
    /// With `force == false` the first item is kept (backspace on an empty
    /// first row) and `None` is returned. Children of a deleted parent follow
    /// the configured `ParentDeleteMode`.
    pub fn delete(&mut self, index: usize, force: bool) -> ListResult<Option<ListItem>> {
        if !force && index == 0 {
            debug!("event=list_delete module=list_manager status=noop reason=first_item");
            return Ok(None);
        }
        let id = self.id_at(index)?;
        let mode = self.editor.config().parent_delete_mode;
        let edit = self.editor.delete(id, mode, Recording::Record)?;
        self.record(edit.change);
        Ok(Some(edit.value))
    }

    /// Deletes an item located by identity; a stale id is a no-op.
    pub fn delete_by_id(&mut self, id: ListItemId) -> ListResult<Option<ListItem>> {
        match self.position_of(id) {
            Some(index) => self.delete(index, true),
            None => {
                warn!(
                    "event=list_delete_by_id module=list_manager status=noop reason=stale_id id={}",
                    id
                );
                Ok(None)
            }
        }
    }

    /// Replaces the body of the item at `index`.
    ///
    /// Consecutive edits of the same item merge into one history entry while
    /// nothing is waiting to be redone.
    pub fn change_body(&mut self, index: usize, body: impl Into<String>) -> ListResult<()> {
        let id = self.id_at(index)?;
        let body = body.into();

        if !self.history.can_redo() {
            if let Ok(ListChange::EditBody {
                id: last_id,
                after,
                ..
            }) = self.history.look_up_mut(0)
            {
                if *last_id == id {
                    self.editor.set_body(id, body.clone(), Recording::Replay)?;
                    *after = body;
                    return Ok(());
                }
            }
        }

        let edit = self.editor.set_body(id, body, Recording::Record)?;
        self.record(edit.change);
        Ok(())
    }

    /// Sets the checkbox of the item at `index`; returns its new index.
    pub fn change_checked(&mut self, index: usize, checked: bool) -> ListResult<usize> {
        let id = self.id_at(index)?;
        let edit = self.editor.set_checked(id, checked, Recording::Record)?;
        self.record(edit.change);
        Ok(edit.value)
    }

    /// Indents (`true`) or outdents (`false`) the item at `index`.
    ///
    /// Outdenting a child makes it inherit the siblings below it; indenting a
    /// parent hands its children to the preceding parent. Groups are re-sorted
    /// afterwards under `CheckedFirst`.
    pub fn change_is_child(&mut self, index: usize, is_child: bool) -> ListResult<()> {
        let id = self.id_at(index)?;
        let edit = self.editor.set_is_child(id, is_child, Recording::Record)?;
        self.record(edit.change);
        Ok(())
    }

    /// Drag reorder; returns the final index.
    ///
    /// Under `CheckedFirst` a parent cannot leave its checked partition; a
    /// move that sorting reverts entirely records nothing.
    pub fn move_item(&mut self, from: usize, to: usize) -> ListResult<usize> {
        let id = self.id_at(from)?;
        let edit = self.editor.move_item(id, to, Recording::Record)?;
        self.record(edit.change);
        Ok(edit.value)
    }

    /// Reverts the last change; `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> ListResult<bool> {
        Self::settle(self.history.undo(&mut self.editor))
    }

    /// Re-applies the next change; `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> ListResult<bool> {
        Self::settle(self.history.redo(&mut self.editor))
    }

    fn settle(result: Result<(), HistoryError<ListError>>) -> ListResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(HistoryError::Change(err)) => Err(err),
            Err(err) => {
                debug!(
                    "event=list_history module=list_manager status=noop reason=\"{}\"",
                    err
                );
                Ok(false)
            }
        }
    }

    fn record(&mut self, change: Option<ListChange>) {
        if let Some(change) = change {
            self.history.push(change);
        }
    }

    fn id_at(&self, index: usize) -> ListResult<ListItemId> {
        self.editor
            .list()
            .id_at(index)
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
    }

    fn neighbour_is_child(&self, position: usize) -> bool {
        let list = self.editor.list();
        let is_child_at = |index: usize| {
            list.id_at(index)
                .and_then(|id| list.is_child(id))
                .unwrap_or(false)
        };
        (position > 0 && is_child_at(position - 1)) || is_child_at(position)
    }
}
