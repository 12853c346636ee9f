//! Reverse geocoding result types.

use serde::{Deserialize, Serialize};

use crate::types::coordinate::GeodeticCoordinate;

/// The nearest address found for a query point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressMatch {
    /// The composed street address of the matched document.
    pub full_address: String,

    /// Stored location of the matched entrance.
    pub location: GeodeticCoordinate,

    /// Great-circle distance from the query point, recomputed with the
    /// haversine formula rather than taken from the engine's sort value.
    pub distance_meters: f64,
}

impl AddressMatch {
    /// Distance rounded down to whole meters, as shown to API consumers.
    pub fn mapping_distance(&self) -> u32 {
        self.distance_meters.max(0.0) as u32
    }
}
