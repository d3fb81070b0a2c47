//! Core checklist engine for CheckNote.
//! This crate is the single source of truth for checklist invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod history;
pub mod list;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ListManagerConfig, ParentDeleteMode};
pub use export::{display_body, to_html, to_json, to_text, ExportError};
pub use history::change_history::{Change, ChangeHistory, HistoryError, HistoryState};
pub use list::nested_list::{ListError, ListResult, NestedList, SortPolicy};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::list_item::{ListItem, ListItemId};
pub use repo::checklist_repo::{
    ChecklistNote, ChecklistRepository, RepoError, RepoResult, SqliteChecklistRepository,
};
pub use service::list_change::ListChange;
pub use service::list_editor::ListEvent;
pub use service::list_manager::ListManager;

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
