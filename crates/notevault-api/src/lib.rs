// REST client for the fallback storage path
// Only used when the direct database connection is down

pub mod notes;

pub use notes::{ApiError, RestNewNote, RestNote, RestNoteUpdate, RestNotesClient};
