//! Checklist editing preferences.
//!
//! # Responsibility
//! - Hold the policies a host selects for one editing session.
//! - Keep the wire shape stable so hosts can persist it as a preference.

use crate::list::nested_list::SortPolicy;
use serde::{Deserialize, Serialize};

/// What happens to a parent's children when the parent is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentDeleteMode {
    /// Delete the children together with the parent.
    #[default]
    DeleteAll,
    /// Keep the children; each one becomes a stand-alone parent.
    Dissolve,
}

/// Session-level editing configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListManagerConfig {
    /// Group ordering re-applied after every edit.
    pub sort_policy: SortPolicy,
    /// Child handling when deleting a parent.
    pub parent_delete_mode: ParentDeleteMode,
}
