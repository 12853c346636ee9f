//! Interface definitions for the geo index provider.
//!
//! This module defines the abstract `GeoIndexProvider` trait that allows
//! for dependency injection and swappable search backend implementations.

mod geo_index_provider;

pub use geo_index_provider::GeoIndexProvider;
