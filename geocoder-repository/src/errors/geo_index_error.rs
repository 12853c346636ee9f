//! Geo index error types.
//!
//! This module defines the unified error type for all search index operations,
//! including low-level backend errors, index-lifecycle consistency errors and
//! caller input errors.

use geocoder_shared::{CoordinateSystemError, TransformError};
use thiserror::Error;

/// Unified errors from geo index operations.
///
/// Used by the `GeoIndexProvider` trait, the bulk loader, the index lifecycle
/// manager and the reverse geocode service.
#[derive(Debug, Clone, Error)]
pub enum GeoIndexError {
    /// Caller input error (unsupported coordinate type, out-of-range coordinate, ...).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A bulk write reported per-document failures or failed as a whole.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create an index generation.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// An index generation with the target name already exists.
    #[error("Index generation already exists: {0}")]
    DuplicateGeneration(String),

    /// The generation about to be aliased does not exist.
    #[error("Index generation not found: {0}")]
    GenerationMissing(String),

    /// Failed to read or update the alias.
    #[error("Alias error: {0}")]
    AliasError(String),

    /// Failed to delete or refresh an index generation.
    #[error("Index administration error: {0}")]
    IndexAdminError(String),

    /// Failed to execute a search.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search index backend.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The document source feeding a bulk load failed.
    #[error("Document source error: {0}")]
    DocumentSourceError(String),

    /// A batch could not be confirmed after exhausting its retries.
    #[error("Search engine operation failed with {unconfirmed} unconfirmed documents: {cause}")]
    OperationFailed { unconfirmed: usize, cause: String },
}

impl GeoIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a duplicate generation error.
    pub fn duplicate_generation(name: impl Into<String>) -> Self {
        Self::DuplicateGeneration(name.into())
    }

    /// Create a missing generation error.
    pub fn generation_missing(name: impl Into<String>) -> Self {
        Self::GenerationMissing(name.into())
    }

    /// Create an alias error.
    pub fn alias(msg: impl Into<String>) -> Self {
        Self::AliasError(msg.into())
    }

    /// Create an index administration error.
    pub fn index_admin(msg: impl Into<String>) -> Self {
        Self::IndexAdminError(msg.into())
    }

    /// Create a search error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a document source error.
    pub fn document_source(msg: impl Into<String>) -> Self {
        Self::DocumentSourceError(msg.into())
    }

    /// Create the fatal error raised when a batch exhausts its retries.
    pub fn operation_failed(unconfirmed: usize, cause: impl Into<String>) -> Self {
        Self::OperationFailed {
            unconfirmed,
            cause: cause.into(),
        }
    }

    /// Whether this error is a caller input problem rather than an engine failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

impl From<TransformError> for GeoIndexError {
    fn from(err: TransformError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<CoordinateSystemError> for GeoIndexError {
    fn from(err: CoordinateSystemError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
