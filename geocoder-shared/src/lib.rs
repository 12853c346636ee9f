//! # Geocoder Shared
//!
//! This crate defines shared data structures and pure geodesy used across the
//! reverse geocoder. It includes the coordinate types, the documents stored in
//! the address index, the planar/geodetic coordinate transformer and the
//! haversine distance calculator.

pub mod geo;
pub mod types;

pub use geo::{haversine_distance, CoordinateTransformer, TransformError};
pub use types::{
    AddressMatch, Coordinate, CoordinateSystem, CoordinateSystemError, GeoDocument,
    GeodeticCoordinate, PlanarCoordinate,
};
