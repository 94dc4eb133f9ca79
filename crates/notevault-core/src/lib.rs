// Core of the note data-access layer - the brain of the operation
pub mod adapter;
pub mod backends;
pub mod config;
pub mod error;
pub mod models;
pub mod notes_with_cache;

pub use adapter::{AccessPath, PersistenceAdapter, Served};
pub use config::Config;
pub use error::Error;
pub use models::{NewNote, Note, NoteChanges, NoteListing, NoteSummary, PageInfo, SortOrder};
pub use notes_with_cache::CachedNotesService;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
