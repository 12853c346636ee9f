//! Request and response types for geo index operations.

use chrono::{DateTime, Utc};
use geocoder_shared::GeoDocument;

/// Result of a bulk write for a single document.
///
/// `position` is the document's index within the submitted batch, so failures
/// can be traced back to the source records.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    pub position: usize,
    /// Whether the write succeeded.
    pub success: bool,
    /// Error reason reported by the engine if the write failed.
    pub error: Option<String>,
}

/// Summary of a bulk write containing aggregate statistics and per-document results.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteSummary {
    /// Total number of documents in the batch.
    pub total: usize,
    /// Number of successful writes.
    pub succeeded: usize,
    /// Number of failed writes.
    pub failed: usize,
    /// Individual results for each document, in submission order.
    pub results: Vec<BulkItemResult>,
}

impl BulkWriteSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Summary for a batch where every document was written.
    pub fn all_succeeded(total: usize) -> Self {
        Self::from_results(
            (0..total)
                .map(|position| BulkItemResult {
                    position,
                    success: true,
                    error: None,
                })
                .collect(),
        )
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Results of the documents the engine rejected.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// One step of an alias update. A list of actions is applied atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

/// A single hit of a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestHit {
    /// The stored document source.
    pub document: GeoDocument,
    /// The engine's own distance sort value in meters, if it returned one.
    /// Used for ordering only.
    pub sort_distance: Option<f64>,
}

/// Parameters of a bounded nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestQuery {
    pub lat: f64,
    pub lon: f64,
    /// Radius of the geo-distance filter in meters.
    pub radius_meters: f64,
    /// Maximum number of hits to return.
    pub size: usize,
}

/// Settings used to create an index generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

/// One complete, independently named build of the address index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGeneration {
    /// Index name, e.g. `address_geo_1735689600`.
    pub name: String,
    pub shard_count: u32,
    pub replica_count: u32,
    pub created_at: DateTime<Utc>,
}
