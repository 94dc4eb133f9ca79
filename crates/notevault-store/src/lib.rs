// Direct storage path: embedded SQLite
// The preferred, lower-latency route for every note operation

pub mod store;

pub use store::{NewStoredNote, SqliteNotesStore, StoreError, StoredNote};
