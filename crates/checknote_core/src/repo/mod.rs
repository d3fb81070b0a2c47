//! Repository layer for persisted checklists.
//!
//! # Responsibility
//! - Define the storage contract used by hosts to load and save documents.
//! - Keep SQL and JSON encoding details out of the editing engine.
//!
//! # Invariants
//! - Persisted items always satisfy `NestedList` structure.
//! - Missing rows surface as `None` on reads and `NotFound` on deletes.

pub mod checklist_repo;
