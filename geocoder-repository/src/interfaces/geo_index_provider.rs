//! Geo index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use geocoder_shared::GeoDocument;

use crate::errors::GeoIndexError;
use crate::types::{AliasAction, BulkWriteSummary, GenerationSettings, NearestHit, NearestQuery};

/// Abstracts the underlying search engine (OpenSearch, Elasticsearch, etc.).
///
/// The geocoder depends only on these capabilities: bulk writes, index
/// administration by name, atomic alias updates and a bounded geo query.
/// Implementations are injected into the loader, lifecycle manager and query
/// engine as `Arc<dyn GeoIndexProvider>`, which keeps them swappable for tests.
///
/// All methods return `Result<T, GeoIndexError>` for consistent error handling
/// across different backend implementations.
#[async_trait]
pub trait GeoIndexProvider: Send + Sync {
    /// Check whether an index with this exact name exists.
    async fn index_exists(&self, index: &str) -> Result<bool, GeoIndexError>;

    /// Create an empty index with the geocoder mapping.
    ///
    /// The mapping has two fields: `fullAddress` (full-text) and `location`
    /// (geo-point).
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index was created
    /// * `Err(GeoIndexError::IndexCreationError)` - If the engine rejected the request
    async fn create_index(
        &self,
        index: &str,
        settings: &GenerationSettings,
    ) -> Result<(), GeoIndexError>;

    /// Delete an index by name.
    async fn delete_index(&self, index: &str) -> Result<(), GeoIndexError>;

    /// Make every document written so far visible to searches on `index`.
    async fn refresh_index(&self, index: &str) -> Result<(), GeoIndexError>;

    /// Write a batch of documents into `index` as a single bulk request.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkWriteSummary)` - Per-document outcome; may contain failures
    /// * `Err(GeoIndexError)` - If the request failed as a whole (transport error, 5xx, ...)
    async fn bulk_index(
        &self,
        index: &str,
        documents: &[GeoDocument],
    ) -> Result<BulkWriteSummary, GeoIndexError>;

    /// Names of the indices the alias currently points at.
    ///
    /// Returns an empty list when the alias does not exist.
    async fn get_alias_targets(&self, alias: &str) -> Result<Vec<String>, GeoIndexError>;

    /// Apply alias actions as one atomic operation.
    ///
    /// Readers never observe a state where only part of `actions` has been applied.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), GeoIndexError>;

    /// Run a geo-distance filtered query sorted by ascending distance.
    ///
    /// # Arguments
    ///
    /// * `target` - Index or alias name to search
    /// * `query` - Center point, radius and result size
    async fn search_nearest(
        &self,
        target: &str,
        query: &NearestQuery,
    ) -> Result<Vec<NearestHit>, GeoIndexError>;
}
