use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Store connection poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A note row as the direct path stores it.
///
/// Column names are camelCase (`userId`, `createdAt`) - the schema predates
/// the REST backend and its snake_case convention, and the two were never
/// reconciled. The persistence adapter translates; we don't.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert payload. Id and timestamps come from the caller so a note written
/// here is byte-for-byte comparable with one written through the fallback.
#[derive(Debug, Clone)]
pub struct NewStoredNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direct notes storage using SQLite
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - Battle-tested and reliable
/// - Doesn't require a separate process
pub struct SqliteNotesStore {
    conn: Mutex<Connection>,
}

impl SqliteNotesStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, mostly for tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                userId TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT,
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL,
                deletedAt TEXT
            )",
            [],
        )?;

        // Listing always filters by owner and sorts by creation time
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notes_owner
             ON notes(userId, createdAt DESC)",
            [],
        )?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn insert_note(&self, note: &NewStoredNote) -> Result<StoredNote> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notes (id, userId, title, content, createdAt, updatedAt, deletedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
            params![
                note.id,
                note.user_id,
                note.title,
                note.content,
                note.created_at.to_rfc3339(),
                note.created_at.to_rfc3339(),
            ],
        )?;
        debug!("inserted note {} for user {}", note.id, note.user_id);

        Self::fetch_note(&conn, &note.id)
    }

    /// Live (non-deleted) notes for a user, newest first.
    pub fn select_notes(&self, user_id: &str, limit: u32) -> Result<Vec<StoredNote>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, userId, title, content, createdAt, updatedAt, deletedAt
             FROM notes
             WHERE userId = ?1 AND deletedAt IS NULL
             ORDER BY createdAt DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit], row_to_note)?;
        let notes = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("selected {} notes for user {}", notes.len(), user_id);
        Ok(notes)
    }

    /// Patch title/content on a live note. `updated_at` is caller-generated,
    /// never `CURRENT_TIMESTAMP`, so both storage paths stamp identically.
    pub fn update_note(
        &self,
        id: &str,
        title: Option<&str>,
        content: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<StoredNote> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notes
             SET title = COALESCE(?2, title),
                 content = COALESCE(?3, content),
                 updatedAt = ?4
             WHERE id = ?1 AND deletedAt IS NULL",
            params![id, title, content, updated_at.to_rfc3339()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Self::fetch_note(&conn, id)
    }

    /// Mark a note deleted without dropping the row. Deleted notes stop
    /// showing up in `select_notes` but stay recoverable.
    pub fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> Result<StoredNote> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notes
             SET deletedAt = ?2, updatedAt = ?2
             WHERE id = ?1 AND deletedAt IS NULL",
            params![id, deleted_at.to_rfc3339()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Self::fetch_note(&conn, id)
    }

    fn fetch_note(conn: &Connection, id: &str) -> Result<StoredNote> {
        let note = conn
            .query_row(
                "SELECT id, userId, title, content, createdAt, updatedAt, deletedAt
                 FROM notes WHERE id = ?1",
                params![id],
                row_to_note,
            )
            .optional()?;

        note.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredNote> {
    Ok(StoredNote {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_ts(row.get::<_, String>(4)?, 4)?,
        updated_at: parse_ts(row.get::<_, String>(5)?, 5)?,
        deleted_at: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_ts(s, 6))
            .transpose()?,
    })
}

fn parse_ts(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> SqliteNotesStore {
        SqliteNotesStore::open_in_memory().unwrap()
    }

    fn new_note(id: &str, user: &str, title: &str, minute: u32) -> NewStoredNote {
        NewStoredNote {
            id: id.to_string(),
            user_id: user.to_string(),
            title: title.to_string(),
            content: Some(format!("body of {}", title)),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_insert_and_select_newest_first() {
        let store = store();
        store.insert_note(&new_note("n1", "u1", "oldest", 0)).unwrap();
        store.insert_note(&new_note("n2", "u1", "newest", 5)).unwrap();
        store.insert_note(&new_note("n3", "u2", "other user", 3)).unwrap();

        let notes = store.select_notes("u1", 10).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].title, "newest");
        assert_eq!(notes[1].title, "oldest");
    }

    #[test]
    fn test_select_respects_limit() {
        let store = store();
        for i in 0..5 {
            store
                .insert_note(&new_note(&format!("n{}", i), "u1", "note", i))
                .unwrap();
        }

        let notes = store.select_notes("u1", 3).unwrap();
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn test_update_patches_only_given_fields() {
        let store = store();
        store.insert_note(&new_note("n1", "u1", "before", 0)).unwrap();

        let stamp = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let updated = store.update_note("n1", Some("after"), None, stamp).unwrap();

        assert_eq!(updated.title, "after");
        assert_eq!(updated.content.as_deref(), Some("body of before"));
        assert_eq!(updated.updated_at, stamp);
    }

    #[test]
    fn test_soft_delete_hides_from_listing() {
        let store = store();
        store.insert_note(&new_note("n1", "u1", "doomed", 0)).unwrap();
        store.insert_note(&new_note("n2", "u1", "survivor", 1)).unwrap();

        let stamp = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let deleted = store.soft_delete("n1", stamp).unwrap();
        assert_eq!(deleted.deleted_at, Some(stamp));

        let notes = store.select_notes("u1", 10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "n2");
    }

    #[test]
    fn test_update_missing_or_deleted_note_is_not_found() {
        let store = store();
        let stamp = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();

        assert!(matches!(
            store.update_note("ghost", Some("x"), None, stamp),
            Err(StoreError::NotFound(_))
        ));

        store.insert_note(&new_note("n1", "u1", "gone", 0)).unwrap();
        store.soft_delete("n1", stamp).unwrap();

        // A second delete of the same note is also NotFound
        assert!(matches!(
            store.soft_delete("n1", stamp),
            Err(StoreError::NotFound(_))
        ));
    }
}
