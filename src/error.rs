//! Error types for try-on operations.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, TryOnError>;

#[derive(Error, Debug)]
pub enum TryOnError {
    /// Referenced id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("No reference photo uploaded")]
    NoReference,

    /// Recommendation needs at least one top and one bottom
    #[error("Wardrobe needs at least one top and one bottom")]
    InsufficientWardrobe,

    /// Record exists but its backing file is gone
    #[error("{0} missing on disk")]
    MissingArtifact(String),

    /// Quota or rate limit signaled by the provider; caller may retry later
    #[error("Provider unavailable, try again later: {0}")]
    ProviderRetryable(String),

    #[error("Provider failed: {0}")]
    ProviderFatal(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image error: {0}")]
    Image(String),
}

impl TryOnError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        TryOnError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TryOnError::NotFound { .. }
                | TryOnError::NoReference
                | TryOnError::InsufficientWardrobe
                | TryOnError::InvalidInput(_)
        )
    }
}

impl From<std::io::Error> for TryOnError {
    fn from(e: std::io::Error) -> Self {
        TryOnError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for TryOnError {
    fn from(e: serde_json::Error) -> Self {
        TryOnError::Storage(format!("serialization failed: {e}"))
    }
}

impl From<image::ImageError> for TryOnError {
    fn from(e: image::ImageError) -> Self {
        TryOnError::Image(e.to_string())
    }
}
