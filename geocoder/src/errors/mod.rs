//! Error types for the geocoder rebuild job.

use geocoder_repository::GeoIndexError;
use thiserror::Error;

/// Errors that can occur while configuring or running a rebuild.
#[derive(Error, Debug)]
pub enum RebuildError {
    /// Invalid job input, such as a malformed extract period.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration or dependency initialization error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The address database failed.
    #[error("Source error: {0}")]
    SourceError(String),

    /// The search engine side of the rebuild failed.
    #[error("Index error: {0}")]
    IndexError(#[from] GeoIndexError),
}

impl RebuildError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a source error.
    pub fn source_failed(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }
}

impl From<sqlx::Error> for RebuildError {
    fn from(err: sqlx::Error) -> Self {
        Self::SourceError(err.to_string())
    }
}
