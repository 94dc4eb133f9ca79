use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// A note as the REST backend sees it.
///
/// The wire format is snake_case (`user_id`, `created_at`), which is NOT the
/// convention the direct database path uses. Translating between the two is the
/// persistence adapter's job, not ours - we just speak the API's dialect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Payload for creating a note. Id and timestamps are caller-supplied so the
/// row matches what the direct path would have written.
#[derive(Debug, Clone, Serialize)]
pub struct RestNewNote {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update payload. Absent fields are left untouched by the backend,
/// so everything is optional and skipped when None.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestNoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

pub struct RestNotesClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl RestNotesClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("NoteVault/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            token,
            base_url,
        }
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref token) = self.token {
            request.bearer_auth(token)
        } else {
            request
        }
    }

    /// Create a note via `POST /notes`.
    pub async fn insert_note(&self, note: &RestNewNote) -> Result<RestNote> {
        let url = format!("{}/notes", self.base_url);
        debug!("POST {} for user {}", url, note.user_id);

        let response = self.authed(self.client.post(&url).json(note)).send().await?;
        self.parse_response(response, &note.id).await
    }

    /// List a user's notes via `GET /notes?user_id=..&limit=..`.
    ///
    /// The backend excludes soft-deleted notes and returns newest first,
    /// mirroring the direct path's SELECT.
    pub async fn select_notes(&self, user_id: &str, limit: u32) -> Result<Vec<RestNote>> {
        let url = format!("{}/notes", self.base_url);
        debug!("GET {} for user {} (limit {})", url, user_id, limit);

        let request = self
            .client
            .get(&url)
            .query(&[("user_id", user_id), ("limit", &limit.to_string())]);

        let response = self.authed(request).send().await?;
        self.parse_response(response, user_id).await
    }

    /// Patch a note via `PATCH /notes/{id}`. Soft-deletes go through here too,
    /// as a patch that sets `deleted_at`.
    pub async fn update_note(&self, id: &str, patch: &RestNoteUpdate) -> Result<RestNote> {
        let url = format!("{}/notes/{}", self.base_url, id);
        debug!("PATCH {}", url);

        let response = self
            .authed(self.client.patch(&url).json(patch))
            .send()
            .await?;
        self.parse_response(response, id).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        subject: &str,
    ) -> Result<T> {
        if response.status() == 404 {
            return Err(ApiError::NotFound(subject.to_string()));
        }

        if response.status() == 401 {
            return Err(ApiError::AuthRequired);
        }

        if response.status() == 429 {
            return Err(ApiError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed(format!(
                "Status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}
