//! Geodesy helpers: planar/geodetic transformation and great-circle distance.

mod distance;
mod transform;

pub use distance::{haversine_distance, EARTH_RADIUS_METERS};
pub use transform::{
    Bounds, CoordinateTransformer, TransformError, TransformerConfig, TransverseMercator,
    NATIONAL_GEOGRAPHIC_BOUNDS, NATIONAL_PLANAR_BOUNDS,
};
