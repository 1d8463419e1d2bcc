//! Error types for the curriculum library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for curriculum operations.
///
/// Loader failures (`SourceUnavailable`, `SourceMalformed`) are recovered
/// inside [`DocumentLoader`](crate::content::DocumentLoader) and only show up
/// in diagnostics. Lookups that find nothing return `None`, not an error.
#[derive(Debug, Error)]
pub enum CurriculumError {
    /// A content document is missing or unreadable.
    #[error("Source unavailable '{path}': {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A content document could not be parsed.
    #[error("Source malformed '{path}': {message}")]
    SourceMalformed { path: PathBuf, message: String },

    /// A required query parameter was empty or absent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A lesson selection pattern could not be compiled.
    #[error("Invalid lesson pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure writing or reading the interaction log.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CurriculumError {
    /// Shorthand for an [`InvalidInput`](Self::InvalidInput) error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether the error was caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Result type alias for curriculum operations.
pub type Result<T> = std::result::Result<T, CurriculumError>;
