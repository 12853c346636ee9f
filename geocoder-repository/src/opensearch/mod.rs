//! OpenSearch implementation of the geo index provider.
//!
//! This module provides a concrete implementation of `GeoIndexProvider`
//! using OpenSearch as the backend.

mod index_config;
mod provider;

pub use index_config::{get_index_settings, get_nearest_query, FULL_ADDRESS_FIELD, LOCATION_FIELD};
pub use provider::OpenSearchProvider;
