// Dual-path persistence: try the direct connection, fall back to REST
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    backends::NotesBackend,
    models::{NewNote, Note, NoteChanges},
    Error, Result,
};

/// Which storage path ended up serving a call. Surfaced for diagnostics only;
/// business logic above the adapter must not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessPath {
    Direct,
    Fallback,
}

impl std::fmt::Display for AccessPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessPath::Direct => write!(f, "direct"),
            AccessPath::Fallback => write!(f, "fallback"),
        }
    }
}

/// A successful result plus the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub data: T,
    pub path: AccessPath,
}

impl<T> Served<T> {
    fn direct(data: T) -> Self {
        Self {
            data,
            path: AccessPath::Direct,
        }
    }

    fn fallback(data: T) -> Self {
        Self {
            data,
            path: AccessPath::Fallback,
        }
    }
}

/// Single call surface for note CRUD that survives the direct connection
/// being down.
///
/// Every operation walks the same explicit state machine:
///
/// ```text
/// TryDirect -> success: Done(direct)
///           -> failure: TryFallback -> success: Done(fallback)
///                                   -> failure: Failed(both messages)
/// ```
///
/// One fallback attempt, no retries, no backoff; timeouts belong to the
/// underlying clients. A direct-path failure is logged and swallowed as long
/// as the fallback covers for it. Ids and timestamps are generated here, once
/// per call, so both paths persist identical rows.
pub struct PersistenceAdapter {
    direct: Arc<dyn NotesBackend>,
    fallback: Arc<dyn NotesBackend>,
}

impl PersistenceAdapter {
    pub fn new(direct: Arc<dyn NotesBackend>, fallback: Arc<dyn NotesBackend>) -> Self {
        Self { direct, fallback }
    }

    pub async fn insert(
        &self,
        user_id: &str,
        title: &str,
        content: Option<&str>,
    ) -> Result<Served<Note>> {
        let note = NewNote::new(user_id, title, content);

        match self.direct.insert(&note).await {
            Ok(data) => {
                debug!("insert {} served by direct path", note.id);
                Ok(Served::direct(data))
            }
            Err(direct_err) => {
                warn!("direct insert failed, trying fallback: {}", direct_err);
                match self.fallback.insert(&note).await {
                    Ok(data) => {
                        debug!("insert {} served by fallback path", note.id);
                        Ok(Served::fallback(data))
                    }
                    Err(fallback_err) => Err(both_failed(direct_err, fallback_err)),
                }
            }
        }
    }

    pub async fn list(&self, user_id: &str, limit: u32) -> Result<Served<Vec<Note>>> {
        match self.direct.select(user_id, limit).await {
            Ok(data) => {
                debug!("list for {} served by direct path ({} notes)", user_id, data.len());
                Ok(Served::direct(data))
            }
            Err(direct_err) => {
                warn!("direct list failed, trying fallback: {}", direct_err);
                match self.fallback.select(user_id, limit).await {
                    Ok(data) => {
                        debug!("list for {} served by fallback path ({} notes)", user_id, data.len());
                        Ok(Served::fallback(data))
                    }
                    Err(fallback_err) => Err(both_failed(direct_err, fallback_err)),
                }
            }
        }
    }

    pub async fn update(&self, note_id: &str, changes: &NoteChanges) -> Result<Served<Note>> {
        // Stamped here, not by the storage engine, so both paths agree
        let updated_at = Utc::now();

        match self.direct.update(note_id, changes, updated_at).await {
            Ok(data) => {
                debug!("update {} served by direct path", note_id);
                Ok(Served::direct(data))
            }
            Err(direct_err) => {
                warn!("direct update failed, trying fallback: {}", direct_err);
                match self.fallback.update(note_id, changes, updated_at).await {
                    Ok(data) => {
                        debug!("update {} served by fallback path", note_id);
                        Ok(Served::fallback(data))
                    }
                    Err(fallback_err) => Err(both_failed(direct_err, fallback_err)),
                }
            }
        }
    }

    pub async fn soft_delete(&self, note_id: &str) -> Result<Served<Note>> {
        let deleted_at = Utc::now();

        match self.direct.soft_delete(note_id, deleted_at).await {
            Ok(data) => {
                debug!("soft delete {} served by direct path", note_id);
                Ok(Served::direct(data))
            }
            Err(direct_err) => {
                warn!("direct soft delete failed, trying fallback: {}", direct_err);
                match self.fallback.soft_delete(note_id, deleted_at).await {
                    Ok(data) => {
                        debug!("soft delete {} served by fallback path", note_id);
                        Ok(Served::fallback(data))
                    }
                    Err(fallback_err) => Err(both_failed(direct_err, fallback_err)),
                }
            }
        }
    }
}

fn both_failed(direct: Error, fallback: Error) -> Error {
    Error::StorageUnavailable {
        direct: direct.to_string(),
        fallback: fallback.to_string(),
    }
}
