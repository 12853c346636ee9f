//! Coordinate types for the reverse geocoder.
//!
//! Planar (national grid, meters) and geodetic (WGS84, degrees) coordinates are
//! distinct types. Moving from one to the other always goes through
//! [`CoordinateTransformer`](crate::geo::CoordinateTransformer).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A projected coordinate in the national planar grid (EPSG:5179), in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlanarCoordinate {
    /// Easting in meters.
    pub x: f64,
    /// Northing in meters.
    pub y: f64,
}

impl PlanarCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A latitude/longitude pair on the WGS84 ellipsoid, in degrees.
///
/// Serializes as `{"lat": .., "lon": ..}`, which is also the object form a
/// geo-point field accepts in the search index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeodeticCoordinate {
    pub lat: f64,
    pub lon: f64,
}

impl GeodeticCoordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether the pair is finite and within the valid latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for GeodeticCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// The coordinate system a caller declares for a numeric pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoordinateSystem {
    /// WGS84 latitude/longitude.
    #[default]
    Geodetic,
    /// National planar grid (UTM-K).
    Planar,
}

/// Returned when a coordinate-system name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported coordinate type: {0}")]
pub struct CoordinateSystemError(pub String);

impl FromStr for CoordinateSystem {
    type Err = CoordinateSystemError;

    /// Accepts `GEODETIC`/`WGS84` and `PLANAR`/`TM`/`UTMK`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GEODETIC" | "WGS84" => Ok(Self::Geodetic),
            "PLANAR" | "TM" | "UTMK" | "UTM-K" => Ok(Self::Planar),
            _ => Err(CoordinateSystemError(s.to_string())),
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geodetic => f.write_str("GEODETIC"),
            Self::Planar => f.write_str("PLANAR"),
        }
    }
}

/// A numeric pair tagged with the coordinate system it belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "system", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Coordinate {
    Geodetic(GeodeticCoordinate),
    Planar(PlanarCoordinate),
}

impl Coordinate {
    /// Build a tagged coordinate from a caller-supplied `(lat, lon)` pair.
    ///
    /// For the planar system the pair is read the way query callers send it:
    /// the `lat` slot carries the easting (`x`) and the `lon` slot carries the
    /// northing (`y`).
    pub fn from_lat_lon(lat: f64, lon: f64, system: CoordinateSystem) -> Self {
        match system {
            CoordinateSystem::Geodetic => Self::Geodetic(GeodeticCoordinate::new(lat, lon)),
            CoordinateSystem::Planar => Self::Planar(PlanarCoordinate::new(lat, lon)),
        }
    }

    pub fn system(&self) -> CoordinateSystem {
        match self {
            Self::Geodetic(_) => CoordinateSystem::Geodetic,
            Self::Planar(_) => CoordinateSystem::Planar,
        }
    }
}
