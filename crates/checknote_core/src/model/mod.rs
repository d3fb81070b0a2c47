//! Checklist domain model.
//!
//! # Responsibility
//! - Define canonical data structures shared by the editing engine,
//!   persistence adapter and export helpers.
//!
//! # Invariants
//! - Every checklist item is identified by a stable `ListItemId`.

pub mod list_item;
