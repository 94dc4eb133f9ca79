use thiserror::Error;

/// All the ways the data-access layer can go wrong
///
/// We use thiserror here because it generates the boilerplate for us.
/// Life's too short to manually implement Display and Error traits.
///
/// Failures come back to callers as values, never as panics: UI code above
/// this layer renders an error state from the variant, no try/catch gymnastics.
#[derive(Error, Debug)]
pub enum Error {
    /// The preferred direct connection failed. On its own this is recoverable
    /// (the adapter falls back) and only ever logged, not surfaced.
    #[error("Direct path failed: {0}")]
    DirectPath(String),

    /// The REST fallback failed.
    #[error("Fallback path failed: {0}")]
    FallbackPath(String),

    /// Both paths failed on the same logical operation. The fallback's message
    /// is the headline; the direct path's is kept for diagnostics.
    #[error("Could not load notes - fallback failed: {fallback} (direct path: {direct})")]
    StorageUnavailable { direct: String, fallback: String },

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
