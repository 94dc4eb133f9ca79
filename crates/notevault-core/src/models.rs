use chrono::{DateTime, Utc};
use notevault_cache::HasNoteId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use notevault_cache::PageInfo;

/// How many characters of content make it into a listing snippet.
const SNIPPET_LEN: usize = 120;

/// A note, the star of the show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert payload with id and creation time fixed up front, so whichever
/// storage path ends up executing writes the exact same row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewNote {
    pub fn new(user_id: &str, title: &str, content: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            content: content.map(|c| c.to_string()),
            created_at: Utc::now(),
        }
    }
}

impl From<NewNote> for Note {
    fn from(new: NewNote) -> Self {
        Note {
            id: new.id,
            user_id: new.user_id,
            title: new.title,
            content: new.content,
            created_at: new.created_at,
            updated_at: new.created_at,
            deleted_at: None,
        }
    }
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// One row of a note listing - what the UI shows per note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub snippet: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            snippet: note.content.as_deref().map(snippet),
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

impl HasNoteId for NoteSummary {
    fn note_id(&self) -> &str {
        &self.id
    }
}

fn snippet(content: &str) -> String {
    // Truncate on a char boundary, not a byte offset
    content.chars().take(SNIPPET_LEN).collect()
}

/// Listing sort orders. The Display form doubles as the cache key segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Title,
}

impl SortOrder {
    pub fn apply(&self, notes: &mut [Note]) {
        match self {
            SortOrder::Newest => notes.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => notes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::Title => {
                notes.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Newest => write!(f, "newest"),
            SortOrder::Oldest => write!(f, "oldest"),
            SortOrder::Title => write!(f, "title"),
        }
    }
}

/// What a listing request returns: one page of summaries plus pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteListing {
    pub notes: Vec<NoteSummary>,
    pub pagination: PageInfo,
}
