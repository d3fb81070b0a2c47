//! Checklist item domain model.
//!
//! # Responsibility
//! - Define the item record exchanged between core, persistence and export.
//! - Define the identity scheme used to re-locate items after reordering.
//!
//! # Invariants
//! - `id` is assigned once and never reused while the item exists.
//! - Only parents (`is_child == false`) carry `children` in steady state.
//! - Nesting depth is at most one level.

use serde::{Deserialize, Serialize};

/// Stable identity of one checklist item within an editing session.
///
/// Positions shift under edits, so all cross references use this id.
pub type ListItemId = u64;

/// One checklist row.
///
/// Parent items carry a snapshot of their children in display order; child
/// items carry an empty `children` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Stable identity, see [`ListItemId`].
    pub id: ListItemId,
    /// Plain text content.
    pub body: String,
    /// Checkbox state.
    pub checked: bool,
    /// Rendered nested under the nearest preceding parent.
    pub is_child: bool,
    /// Children of a parent item. Always empty on child items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ListItem>,
}

impl ListItem {
    /// Creates an unchecked parent item with no children.
    pub fn new(id: ListItemId, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
            checked: false,
            is_child: false,
            children: Vec::new(),
        }
    }

    /// Creates an unchecked child item.
    pub fn child(id: ListItemId, body: impl Into<String>) -> Self {
        Self {
            is_child: true,
            ..Self::new(id, body)
        }
    }

    /// Returns this item with the checkbox set.
    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Returns this item with the given children attached.
    pub fn with_children(mut self, children: Vec<ListItem>) -> Self {
        self.children = children;
        self
    }

    /// Ids of this item followed by the ids of its children.
    pub fn subtree_ids(&self) -> Vec<ListItemId> {
        let mut ids = Vec::with_capacity(self.children.len() + 1);
        ids.push(self.id);
        ids.extend(self.children.iter().map(|child| child.id));
        ids
    }
}
