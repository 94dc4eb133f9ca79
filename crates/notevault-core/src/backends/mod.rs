// Storage backend implementations for the two access paths
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    models::{NewNote, Note, NoteChanges},
    Result,
};

pub mod rest;
pub mod sqlite;

pub use rest::RestBackend;
pub use sqlite::SqliteBackend;

/// One logical storage path for notes - makes testing easier and keeps the
/// adapter honest about what "the same operation on the other path" means.
///
/// Both implementations take caller-generated ids and timestamps so the rows
/// they produce are comparable; each one translates to its own client's call
/// shape (camelCase columns vs snake_case wire fields) internally.
#[async_trait]
pub trait NotesBackend: Send + Sync {
    async fn insert(&self, note: &NewNote) -> Result<Note>;

    /// Live notes for a user, newest first, capped at `limit`.
    async fn select(&self, user_id: &str, limit: u32) -> Result<Vec<Note>>;

    async fn update(
        &self,
        note_id: &str,
        changes: &NoteChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Note>;

    async fn soft_delete(&self, note_id: &str, deleted_at: DateTime<Utc>) -> Result<Note>;
}
