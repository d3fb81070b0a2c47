//! Checklist editing services.
//!
//! # Responsibility
//! - Expose the editing-session facade (`ListManager`) to hosts.
//! - Keep history bookkeeping separate from structural list operations.
//!
//! # See also
//! - `crate::list::nested_list` for the structural primitives.

pub mod list_change;
pub mod list_editor;
pub mod list_manager;
