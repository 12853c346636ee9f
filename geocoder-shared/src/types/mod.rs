//! This module defines the core data structures and types used across the geocoder.
//! It re-exports the coordinate, document and match types.

pub mod address_match;
pub mod coordinate;
pub mod geo_document;

pub use address_match::AddressMatch;
pub use coordinate::{
    Coordinate, CoordinateSystem, CoordinateSystemError, GeodeticCoordinate, PlanarCoordinate,
};
pub use geo_document::GeoDocument;
