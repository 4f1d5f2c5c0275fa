//! Error types for kosh.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using kosh's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kosh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Mention text was empty or blank; rejected before candidate retrieval
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Strict mode and zero candidates; the one fatal resolution path
    #[error("No candidates found for mention {mention_id}")]
    NoCandidatesFound { mention_id: Uuid },

    /// Similarity index timeout or transport failure.
    ///
    /// Recovered inside the resolution path as "zero candidates"; only
    /// surfaced by operations that query the index directly.
    #[error("Similarity search unavailable: {0}")]
    SearchUnavailable(String),

    /// Review submitted for a mention with no prior resolution
    #[error("Unknown mention: {0}")]
    UnknownMention(Uuid),

    /// Review violates the ledger contract (missing chosen key or manual value)
    #[error("Invalid review: {0}")]
    InvalidReview(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::SearchUnavailable(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
