//! Error types for the geocoder repository.
//!
//! This module provides a unified error type for all search index operations.

mod geo_index_error;

pub use geo_index_error::GeoIndexError;
