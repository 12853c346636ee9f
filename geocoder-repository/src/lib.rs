//! # Geocoder Repository
//!
//! Everything that talks to the search engine: the provider abstraction and
//! its OpenSearch implementation, the bulk loader, the blue/green index
//! lifecycle and the nearest-address query used for reverse geocoding.

pub mod bulk_loader;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod lifecycle;
pub mod opensearch;
pub mod query;
pub mod service;
pub mod types;

pub use bulk_loader::{BulkLoader, LoadReport};
pub use config::{BulkLoadConfig, IndexSettings, QueryConfig, RetryPolicy, DEFAULT_ALIAS};
pub use errors::GeoIndexError;
pub use interfaces::GeoIndexProvider;
pub use lifecycle::{alias_swap_actions, IndexLifecycleManager, RebuildReport, RebuildState};
pub use opensearch::OpenSearchProvider;
pub use query::NearestAddressQuery;
pub use service::ReverseGeocodeService;
pub use types::{
    AliasAction, BulkItemResult, BulkWriteSummary, GenerationSettings, IndexGeneration,
    NearestHit, NearestQuery,
};
