// Fallback path: REST client, bridged onto the NotesBackend trait
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notevault_api::{ApiError, RestNewNote, RestNote, RestNoteUpdate, RestNotesClient};

use crate::{
    backends::NotesBackend,
    models::{NewNote, Note, NoteChanges},
    Error, Result,
};

/// Wrapper around RestNotesClient that implements NotesBackend.
///
/// This is where the naming translation happens: our models go out as the
/// API's snake_case wire types, never as the direct path's column names.
pub struct RestBackend {
    client: RestNotesClient,
}

impl RestBackend {
    pub fn new(client: RestNotesClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotesBackend for RestBackend {
    async fn insert(&self, note: &NewNote) -> Result<Note> {
        let wire = RestNewNote {
            id: note.id.clone(),
            user_id: note.user_id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            created_at: note.created_at,
            updated_at: note.created_at,
        };

        let created = self.client.insert_note(&wire).await.map_err(map_err)?;
        Ok(rest_to_note(created))
    }

    async fn select(&self, user_id: &str, limit: u32) -> Result<Vec<Note>> {
        let notes = self
            .client
            .select_notes(user_id, limit)
            .await
            .map_err(map_err)?;
        Ok(notes.into_iter().map(rest_to_note).collect())
    }

    async fn update(
        &self,
        note_id: &str,
        changes: &NoteChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Note> {
        let patch = RestNoteUpdate {
            title: changes.title.clone(),
            content: changes.content.clone(),
            updated_at: Some(updated_at),
            deleted_at: None,
        };

        let updated = self
            .client
            .update_note(note_id, &patch)
            .await
            .map_err(map_err)?;
        Ok(rest_to_note(updated))
    }

    async fn soft_delete(&self, note_id: &str, deleted_at: DateTime<Utc>) -> Result<Note> {
        // Soft delete is just a patch that stamps deleted_at
        let patch = RestNoteUpdate {
            updated_at: Some(deleted_at),
            deleted_at: Some(deleted_at),
            ..Default::default()
        };

        let deleted = self
            .client
            .update_note(note_id, &patch)
            .await
            .map_err(map_err)?;
        Ok(rest_to_note(deleted))
    }
}

fn map_err(e: ApiError) -> Error {
    match e {
        ApiError::NotFound(id) => Error::NotFound(id),
        other => Error::FallbackPath(other.to_string()),
    }
}

/// Convert a wire note to our internal Note model
fn rest_to_note(wire: RestNote) -> Note {
    Note {
        id: wire.id,
        user_id: wire.user_id,
        title: wire.title,
        content: wire.content,
        created_at: wire.created_at,
        updated_at: wire.updated_at,
        deleted_at: wire.deleted_at,
    }
}
