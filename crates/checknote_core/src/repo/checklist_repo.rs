//! Checklist note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist whole checklist snapshots keyed by note uuid.
//! - Persist per-note editing preferences.
//!
//! # Invariants
//! - Writes and reads both validate items through `NestedList`, so invalid
//!   structure is rejected instead of masked.
//! - `list_notes` order is `updated_at DESC, uuid ASC`.
//! - Deleting a note removes its preferences.

use crate::config::ListManagerConfig;
use crate::db::DbError;
use crate::list::nested_list::{ListError, NestedList};
use crate::model::list_item::ListItem;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for checklist persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Items violate checklist structure.
    Structure(ListError),
    NotFound(Uuid),
    /// Row content cannot be decoded.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Structure(err) => write!(f, "invalid checklist structure: {err}"),
            Self::NotFound(uuid) => write!(f, "checklist not found: {uuid}"),
            Self::InvalidData(message) => write!(f, "invalid persisted checklist: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Structure(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ListError> for RepoError {
    fn from(value: ListError) -> Self {
        Self::Structure(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// One persisted checklist document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistNote {
    pub uuid: Uuid,
    pub title: String,
    /// Flat list as produced by `ListManager::items`.
    pub items: Vec<ListItem>,
    /// Epoch milliseconds of the last save.
    pub updated_at: i64,
}

impl ChecklistNote {
    /// Creates an empty note with a fresh v4 uuid.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            items: Vec::new(),
            updated_at: now_millis(),
        }
    }
}

/// Repository interface for checklist notes.
pub trait ChecklistRepository {
    /// Inserts or replaces `note`; returns the stored `updated_at`.
    fn save_note(&self, note: &ChecklistNote) -> RepoResult<i64>;
    fn get_note(&self, uuid: Uuid) -> RepoResult<Option<ChecklistNote>>;
    /// All notes, most recently saved first.
    fn list_notes(&self) -> RepoResult<Vec<ChecklistNote>>;
    /// Removes a note; `NotFound` when no row matched.
    fn delete_note(&self, uuid: Uuid) -> RepoResult<()>;
    /// Stores editing preferences for an existing note.
    fn save_config(&self, uuid: Uuid, config: &ListManagerConfig) -> RepoResult<()>;
    /// Preferences of a note, `None` when never saved.
    fn get_config(&self, uuid: Uuid) -> RepoResult<Option<ListManagerConfig>>;
}

/// SQLite-backed checklist repository.
pub struct SqliteChecklistRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChecklistRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

const NOTE_SELECT_SQL: &str = "SELECT note_uuid, title, items_json, updated_at FROM checklists";

impl ChecklistRepository for SqliteChecklistRepository<'_> {
    fn save_note(&self, note: &ChecklistNote) -> RepoResult<i64> {
        NestedList::from_items(note.items.clone())?;
        let items_json = serde_json::to_string(&note.items)?;
        let updated_at = now_millis();

        self.conn.execute(
            "INSERT INTO checklists (note_uuid, title, items_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(note_uuid) DO UPDATE SET
                title = excluded.title,
                items_json = excluded.items_json,
                updated_at = excluded.updated_at;",
            params![note.uuid.to_string(), note.title, items_json, updated_at],
        )?;
        debug!(
            "event=checklist_save module=repo status=ok note={} items={}",
            note.uuid,
            note.items.len()
        );
        Ok(updated_at)
    }

    fn get_note(&self, uuid: Uuid) -> RepoResult<Option<ChecklistNote>> {
        let row = self
            .conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE note_uuid = ?1;"),
                params![uuid.to_string()],
                read_row,
            )
            .optional()?;
        row.map(decode_row).transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<ChecklistNote>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} ORDER BY updated_at DESC, note_uuid ASC;"
        ))?;
        let rows = stmt.query_map([], read_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(decode_row(row?)?);
        }
        Ok(notes)
    }

    fn delete_note(&self, uuid: Uuid) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM checklists WHERE note_uuid = ?1;",
            params![uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(uuid));
        }
        debug!("event=checklist_delete module=repo status=ok note={}", uuid);
        Ok(())
    }

    fn save_config(&self, uuid: Uuid, config: &ListManagerConfig) -> RepoResult<()> {
        if self.get_note(uuid)?.is_none() {
            return Err(RepoError::NotFound(uuid));
        }
        self.conn.execute(
            "INSERT INTO checklist_preferences (note_uuid, config_json)
             VALUES (?1, ?2)
             ON CONFLICT(note_uuid) DO UPDATE SET config_json = excluded.config_json;",
            params![uuid.to_string(), serde_json::to_string(config)?],
        )?;
        Ok(())
    }

    fn get_config(&self, uuid: Uuid) -> RepoResult<Option<ListManagerConfig>> {
        let json = self
            .conn
            .query_row(
                "SELECT config_json FROM checklist_preferences WHERE note_uuid = ?1;",
                params![uuid.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        json.map(|json| serde_json::from_str(&json).map_err(RepoError::from))
            .transpose()
    }
}

struct StoredRow {
    uuid: String,
    title: String,
    items_json: String,
    updated_at: i64,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        uuid: row.get("note_uuid")?,
        title: row.get("title")?,
        items_json: row.get("items_json")?,
        updated_at: row.get("updated_at")?,
    })
}

fn decode_row(row: StoredRow) -> RepoResult<ChecklistNote> {
    let uuid = Uuid::parse_str(&row.uuid)
        .map_err(|err| RepoError::InvalidData(format!("bad note uuid `{}`: {err}", row.uuid)))?;
    let items: Vec<ListItem> = serde_json::from_str(&row.items_json)?;
    if let Err(err) = NestedList::from_items(items.clone()) {
        error!(
            "event=checklist_load module=repo status=error note={} error={}",
            uuid, err
        );
        return Err(err.into());
    }
    Ok(ChecklistNote {
        uuid,
        title: row.title,
        items,
        updated_at: row.updated_at,
    })
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
