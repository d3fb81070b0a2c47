//! Undo/redo command history.
//!
//! # Responsibility
//! - Store reversible changes independent of what they change.
//! - Expose undo/redo availability for editing surfaces.

pub mod change_history;
