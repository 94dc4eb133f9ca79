// Direct path: embedded SQLite, bridged onto the NotesBackend trait
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notevault_store::{NewStoredNote, SqliteNotesStore, StoreError, StoredNote};

use crate::{
    backends::NotesBackend,
    models::{NewNote, Note, NoteChanges},
    Error, Result,
};

/// Wrapper around SqliteNotesStore that implements NotesBackend.
///
/// The store itself is synchronous; queries are cheap enough that running
/// them inline on the async executor has never shown up in a profile.
pub struct SqliteBackend {
    store: SqliteNotesStore,
}

impl SqliteBackend {
    pub fn new(store: SqliteNotesStore) -> Self {
        Self { store }
    }

    pub fn open(db_path: &str) -> Result<Self> {
        let store = SqliteNotesStore::open(db_path).map_err(map_err)?;
        Ok(Self::new(store))
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = SqliteNotesStore::open_in_memory().map_err(map_err)?;
        Ok(Self::new(store))
    }
}

#[async_trait]
impl NotesBackend for SqliteBackend {
    async fn insert(&self, note: &NewNote) -> Result<Note> {
        let stored = self
            .store
            .insert_note(&NewStoredNote {
                id: note.id.clone(),
                user_id: note.user_id.clone(),
                title: note.title.clone(),
                content: note.content.clone(),
                created_at: note.created_at,
            })
            .map_err(map_err)?;

        Ok(stored_to_note(stored))
    }

    async fn select(&self, user_id: &str, limit: u32) -> Result<Vec<Note>> {
        let stored = self.store.select_notes(user_id, limit).map_err(map_err)?;
        Ok(stored.into_iter().map(stored_to_note).collect())
    }

    async fn update(
        &self,
        note_id: &str,
        changes: &NoteChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Note> {
        let stored = self
            .store
            .update_note(
                note_id,
                changes.title.as_deref(),
                changes.content.as_deref(),
                updated_at,
            )
            .map_err(map_err)?;

        Ok(stored_to_note(stored))
    }

    async fn soft_delete(&self, note_id: &str, deleted_at: DateTime<Utc>) -> Result<Note> {
        let stored = self.store.soft_delete(note_id, deleted_at).map_err(map_err)?;
        Ok(stored_to_note(stored))
    }
}

fn map_err(e: StoreError) -> Error {
    match e {
        StoreError::NotFound(id) => Error::NotFound(id),
        other => Error::DirectPath(other.to_string()),
    }
}

/// Convert a stored row to our internal Note model
fn stored_to_note(stored: StoredNote) -> Note {
    Note {
        id: stored.id,
        user_id: stored.user_id,
        title: stored.title,
        content: stored.content,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
        deleted_at: stored.deleted_at,
    }
}
