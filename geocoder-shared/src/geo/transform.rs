//! Coordinate transformation between the national planar grid and WGS84.
//!
//! The planar system is the Korean unified Transverse Mercator grid (UTM-K,
//! EPSG:5179) on the GRS80 ellipsoid. GRS80 and WGS84 differ by well under a
//! millimeter at the surface, so no datum shift is applied and the inverse
//! projection yields EPSG:4326 latitude/longitude directly.
//!
//! Both ends of a transformation are range-checked: the input against the
//! national planar bounding box, the output against the national geographic
//! bounding box. Out-of-range values produce a [`TransformError`]; there is no
//! sentinel coordinate.

use thiserror::Error;

use crate::types::{Coordinate, GeodeticCoordinate, PlanarCoordinate};

/// Why a coordinate could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The planar input lies outside the national planar bounding box.
    #[error("Planar coordinate out of bounds: x={x}, y={y}")]
    PlanarOutOfBounds { x: f64, y: f64 },

    /// The geodetic result (or input) lies outside the national geographic bounding box.
    #[error("Geodetic coordinate out of bounds: lat={lat}, lon={lon}")]
    GeodeticOutOfBounds { lat: f64, lon: f64 },

    /// The input contains NaN or infinite values.
    #[error("Invalid coordinate input: {0}")]
    InvalidInput(String),
}

/// An axis-aligned bounding box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Valid UTM-K extent in meters: x (easting) then y (northing).
pub const NATIONAL_PLANAR_BOUNDS: Bounds =
    Bounds::new(900_000.0, 1_100_000.0, 1_600_000.0, 2_300_000.0);

/// Valid geographic extent in degrees: longitude as x, latitude as y.
pub const NATIONAL_GEOGRAPHIC_BOUNDS: Bounds = Bounds::new(124.0, 132.0, 33.0, 43.0);

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Semi-major axis in meters.
    pub semi_major_axis: f64,
    /// Inverse flattening.
    pub inverse_flattening: f64,
    /// Latitude of origin in degrees.
    pub latitude_of_origin: f64,
    /// Central meridian in degrees.
    pub central_meridian: f64,
    pub scale_factor: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl TransverseMercator {
    /// EPSG:5179, Korea 2000 / Unified CS.
    pub const UTM_K: Self = Self {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
        latitude_of_origin: 38.0,
        central_meridian: 127.5,
        scale_factor: 0.9996,
        false_easting: 1_000_000.0,
        false_northing: 2_000_000.0,
    };

    fn eccentricity_squared(&self) -> f64 {
        let f = 1.0 / self.inverse_flattening;
        f * (2.0 - f)
    }

    /// Meridian arc length from the equator to `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.eccentricity_squared();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        self.semi_major_axis
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Project a geodetic point onto the grid.
    pub fn forward(&self, point: GeodeticCoordinate) -> PlanarCoordinate {
        let a = self.semi_major_axis;
        let e2 = self.eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale_factor;

        let phi = point.lat.to_radians();
        let lambda = point.lon.to_radians();
        let lambda0 = self.central_meridian.to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();
        let n = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let big_a = (lambda - lambda0) * cos_phi;
        let m = self.meridian_arc(phi);
        let m0 = self.meridian_arc(self.latitude_of_origin.to_radians());

        let x = self.false_easting
            + k0 * n
                * (big_a
                    + (1.0 - t + c) * big_a.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0);

        let y = self.false_northing
            + k0 * (m - m0
                + n * tan_phi
                    * (big_a.powi(2) / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                            / 720.0));

        PlanarCoordinate::new(x, y)
    }

    /// Recover the geodetic point for a grid coordinate.
    pub fn inverse(&self, point: PlanarCoordinate) -> GeodeticCoordinate {
        let a = self.semi_major_axis;
        let e2 = self.eccentricity_squared();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);
        let k0 = self.scale_factor;

        let m0 = self.meridian_arc(self.latitude_of_origin.to_radians());
        let m = m0 + (point.y - self.false_northing) / k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1_e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);

        // Footpoint latitude
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let w = 1.0 - e2 * sin_phi1 * sin_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = a / w.sqrt();
        let r1 = a * (1.0 - e2) / w.powf(1.5);
        let d = (point.x - self.false_easting) / (n1 * k0);

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lambda = self.central_meridian.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        GeodeticCoordinate::new(phi.to_degrees(), lambda.to_degrees())
    }
}

/// Configuration for a [`CoordinateTransformer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformerConfig {
    pub projection: TransverseMercator,
    pub planar_bounds: Bounds,
    pub geographic_bounds: Bounds,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            projection: TransverseMercator::UTM_K,
            planar_bounds: NATIONAL_PLANAR_BOUNDS,
            geographic_bounds: NATIONAL_GEOGRAPHIC_BOUNDS,
        }
    }
}

/// Converts between planar grid coordinates and WGS84 latitude/longitude.
///
/// Pure and cheap to copy; share one instance freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateTransformer {
    config: TransformerConfig,
}

impl CoordinateTransformer {
    pub fn new(config: TransformerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    /// Convert a planar coordinate to WGS84.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - either component is NaN or infinite
    /// * `PlanarOutOfBounds` - the input is outside the planar bounding box
    /// * `GeodeticOutOfBounds` - the projected point is outside the geographic bounding box
    ///
    /// # Example
    ///
    /// ```
    /// use geocoder_shared::{CoordinateTransformer, PlanarCoordinate};
    ///
    /// let transformer = CoordinateTransformer::default();
    /// let origin = transformer
    ///     .transform(PlanarCoordinate::new(1_000_000.0, 2_000_000.0))
    ///     .unwrap();
    /// assert!((origin.lat - 38.0).abs() < 1e-7);
    /// assert!((origin.lon - 127.5).abs() < 1e-7);
    /// ```
    pub fn transform(&self, planar: PlanarCoordinate) -> Result<GeodeticCoordinate, TransformError> {
        if !planar.x.is_finite() || !planar.y.is_finite() {
            return Err(TransformError::InvalidInput(format!(
                "x={}, y={}",
                planar.x, planar.y
            )));
        }
        if !self.config.planar_bounds.contains(planar.x, planar.y) {
            return Err(TransformError::PlanarOutOfBounds {
                x: planar.x,
                y: planar.y,
            });
        }

        let geodetic = self.config.projection.inverse(planar);
        self.check_geographic(geodetic)?;
        Ok(geodetic)
    }

    /// Convert a WGS84 coordinate to the planar grid.
    ///
    /// The input must lie within the geographic bounding box and the result
    /// within the planar bounding box.
    pub fn to_planar(&self, geodetic: GeodeticCoordinate) -> Result<PlanarCoordinate, TransformError> {
        if !geodetic.lat.is_finite() || !geodetic.lon.is_finite() {
            return Err(TransformError::InvalidInput(format!(
                "lat={}, lon={}",
                geodetic.lat, geodetic.lon
            )));
        }
        self.check_geographic(geodetic)?;

        let planar = self.config.projection.forward(geodetic);
        if !self.config.planar_bounds.contains(planar.x, planar.y) {
            return Err(TransformError::PlanarOutOfBounds {
                x: planar.x,
                y: planar.y,
            });
        }
        Ok(planar)
    }

    /// Resolve a tagged coordinate to WGS84.
    ///
    /// Geodetic input passes through unchanged; the tag alone selects the path.
    pub fn to_geodetic(&self, coordinate: Coordinate) -> Result<GeodeticCoordinate, TransformError> {
        match coordinate {
            Coordinate::Geodetic(geodetic) => Ok(geodetic),
            Coordinate::Planar(planar) => self.transform(planar),
        }
    }

    fn check_geographic(&self, geodetic: GeodeticCoordinate) -> Result<(), TransformError> {
        if self
            .config
            .geographic_bounds
            .contains(geodetic.lon, geodetic.lat)
        {
            Ok(())
        } else {
            Err(TransformError::GeodeticOutOfBounds {
                lat: geodetic.lat,
                lon: geodetic.lon,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS_DEG: f64 = 1e-7;

    fn corners(bounds: Bounds) -> [PlanarCoordinate; 4] {
        [
            PlanarCoordinate::new(bounds.min_x, bounds.min_y),
            PlanarCoordinate::new(bounds.max_x, bounds.min_y),
            PlanarCoordinate::new(bounds.min_x, bounds.max_y),
            PlanarCoordinate::new(bounds.max_x, bounds.max_y),
        ]
    }

    #[test]
    fn test_origin_maps_to_projection_center() {
        let transformer = CoordinateTransformer::default();
        let result = transformer
            .transform(PlanarCoordinate::new(1_000_000.0, 2_000_000.0))
            .unwrap();

        assert!((result.lat - 38.0).abs() < EPS_DEG);
        assert!((result.lon - 127.5).abs() < EPS_DEG);
    }

    #[test]
    fn test_known_point_seoul_city_hall() {
        let transformer = CoordinateTransformer::default();
        let result = transformer
            .transform(PlanarCoordinate::new(953_892.21, 1_952_009.94))
            .unwrap();

        assert!((result.lat - 37.5663).abs() < 1e-5, "lat {}", result.lat);
        assert!((result.lon - 126.9779).abs() < 1e-5, "lon {}", result.lon);
    }

    #[test]
    fn test_rejects_points_outside_planar_box() {
        let transformer = CoordinateTransformer::default();
        let outside = [
            PlanarCoordinate::new(899_999.99, 2_000_000.0),
            PlanarCoordinate::new(1_100_000.01, 2_000_000.0),
            PlanarCoordinate::new(1_000_000.0, 1_599_999.99),
            PlanarCoordinate::new(1_000_000.0, 2_300_000.01),
            PlanarCoordinate::new(0.0, 0.0),
            PlanarCoordinate::new(-1_000_000.0, 5_000_000.0),
        ];

        for point in outside {
            assert_eq!(
                transformer.transform(point),
                Err(TransformError::PlanarOutOfBounds {
                    x: point.x,
                    y: point.y
                }),
                "expected rejection for {point:?}"
            );
        }
    }

    #[test]
    fn test_rejects_non_finite_input() {
        let transformer = CoordinateTransformer::default();
        assert!(matches!(
            transformer.transform(PlanarCoordinate::new(f64::NAN, 2_000_000.0)),
            Err(TransformError::InvalidInput(_))
        ));
        assert!(matches!(
            transformer.transform(PlanarCoordinate::new(1_000_000.0, f64::INFINITY)),
            Err(TransformError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_planar_box_corners_land_inside_geographic_box() {
        let transformer = CoordinateTransformer::default();

        for corner in corners(NATIONAL_PLANAR_BOUNDS) {
            let result = transformer.transform(corner).unwrap();
            assert!(
                NATIONAL_GEOGRAPHIC_BOUNDS.contains(result.lon, result.lat),
                "{corner:?} -> {result:?}"
            );
        }
    }

    #[test]
    fn test_corners_outside_narrow_geographic_box_are_flagged_not_clamped() {
        let transformer = CoordinateTransformer::new(TransformerConfig {
            geographic_bounds: Bounds::new(126.5, 128.5, 35.0, 40.0),
            ..TransformerConfig::default()
        });

        for corner in corners(NATIONAL_PLANAR_BOUNDS) {
            match transformer.transform(corner) {
                Err(TransformError::GeodeticOutOfBounds { lat, lon }) => {
                    // The reported values are the projected ones, not clamped to the box.
                    assert!(!(126.5..=128.5).contains(&lon) || !(35.0..=40.0).contains(&lat));
                }
                other => panic!("expected GeodeticOutOfBounds for {corner:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_to_geodetic_identity_for_geodetic_input() {
        let transformer = CoordinateTransformer::default();
        // Values that would be out of range as planar input are untouched.
        let point = GeodeticCoordinate::new(37.5665, 126.978);

        assert_eq!(
            transformer.to_geodetic(Coordinate::Geodetic(point)),
            Ok(point)
        );
    }

    #[test]
    fn test_to_geodetic_dispatches_planar_by_tag() {
        let transformer = CoordinateTransformer::default();
        let result = transformer
            .to_geodetic(Coordinate::Planar(PlanarCoordinate::new(
                1_000_000.0,
                2_000_000.0,
            )))
            .unwrap();
        assert!((result.lat - 38.0).abs() < EPS_DEG);

        assert!(transformer
            .to_geodetic(Coordinate::Planar(PlanarCoordinate::new(37.5, 127.0)))
            .is_err());
    }

    #[test]
    fn test_round_trip_through_forward_projection() {
        let transformer = CoordinateTransformer::default();
        let points = [
            GeodeticCoordinate::new(37.5663, 126.9779),
            GeodeticCoordinate::new(35.5, 127.2),
            GeodeticCoordinate::new(38.0, 127.5),
            GeodeticCoordinate::new(36.35, 127.38),
        ];

        for point in points {
            let planar = transformer.to_planar(point).unwrap();
            let back = transformer.transform(planar).unwrap();
            assert!((back.lat - point.lat).abs() < EPS_DEG, "{point:?} -> {back:?}");
            assert!((back.lon - point.lon).abs() < EPS_DEG, "{point:?} -> {back:?}");
        }
    }

    #[test]
    fn test_busan_projects_outside_planar_box() {
        // Busan lies east of the 1,100,000 m easting limit.
        let transformer = CoordinateTransformer::default();
        let result = transformer.to_planar(GeodeticCoordinate::new(35.1796, 129.0756));
        assert!(matches!(
            result,
            Err(TransformError::PlanarOutOfBounds { x, .. }) if x > 1_100_000.0
        ));
    }

    #[test]
    fn test_to_planar_rejects_points_outside_geographic_box() {
        let transformer = CoordinateTransformer::default();
        assert_eq!(
            transformer.to_planar(GeodeticCoordinate::new(51.5, -0.12)),
            Err(TransformError::GeodeticOutOfBounds {
                lat: 51.5,
                lon: -0.12
            })
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(NATIONAL_PLANAR_BOUNDS.contains(900_000.0, 1_600_000.0));
        assert!(NATIONAL_PLANAR_BOUNDS.contains(1_100_000.0, 2_300_000.0));
        assert!(!NATIONAL_PLANAR_BOUNDS.contains(1_100_000.1, 2_300_000.0));
    }
}
