//! Nested ordered checklist container.
//!
//! # Responsibility
//! - Keep checklist items in display order with one level of nesting.
//! - Provide the structural primitives that edits and history replay share.

pub mod nested_list;
