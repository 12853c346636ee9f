//! Great-circle distance on a spherical Earth.

use crate::types::GeodeticCoordinate;

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two geodetic points, in meters.
///
/// # Example
///
/// ```
/// use geocoder_shared::{haversine_distance, GeodeticCoordinate};
///
/// let a = GeodeticCoordinate::new(0.0, 0.0);
/// let b = GeodeticCoordinate::new(0.0, 1.0);
/// assert!((haversine_distance(a, b) - 111_194.93).abs() < 0.01);
/// ```
pub fn haversine_distance(a: GeodeticCoordinate, b: GeodeticCoordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}
