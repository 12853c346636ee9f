//! Road-name address records and the paginated source they are read from.

mod postgres;

pub use postgres::PostgresAddressSource;

use async_trait::async_trait;
use geocoder_shared::{Coordinate, CoordinateSystem, GeodeticCoordinate, PlanarCoordinate};

use crate::errors::RebuildError;

/// Basement flag value marking an underground building.
const BASEMENT: &str = "1";

/// Prefix of the building number of an underground building.
const BASEMENT_MARKER: &str = "지하";

/// A canonical road-name address record.
///
/// Identified by the composite key `(address_management_no, road_name_code,
/// is_basement, building_main_no, building_sub_no)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadNameAddress {
    pub address_management_no: String,
    pub road_name_code: String,
    /// `0` above ground, `1` basement, `2` aerial, `3` on water.
    pub is_basement: String,
    pub building_main_no: i32,
    pub building_sub_no: i32,
    pub sido_name: Option<String>,
    pub sigungu_name: Option<String>,
    pub legal_emd_name: Option<String>,
    pub road_name: Option<String>,
}

impl RoadNameAddress {
    /// Compose the display address: province, district, legal town, road
    /// name and building number, skipping blank parts.
    ///
    /// ```
    /// use geocoder::source::RoadNameAddress;
    ///
    /// let address = RoadNameAddress {
    ///     address_management_no: "1114010300".to_string(),
    ///     road_name_code: "111103100014".to_string(),
    ///     is_basement: "0".to_string(),
    ///     building_main_no: 110,
    ///     building_sub_no: 0,
    ///     sido_name: Some("서울특별시".to_string()),
    ///     sigungu_name: Some("중구".to_string()),
    ///     legal_emd_name: Some("태평로1가".to_string()),
    ///     road_name: Some("세종대로".to_string()),
    /// };
    /// assert_eq!(address.full_address(), "서울특별시 중구 태평로1가 세종대로 110");
    /// ```
    pub fn full_address(&self) -> String {
        let mut parts: Vec<String> = [
            &self.sido_name,
            &self.sigungu_name,
            &self.legal_emd_name,
            &self.road_name,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();

        parts.push(self.building_number());
        parts.join(" ")
    }

    /// Building number as `main[-sub]`, with the basement marker when underground.
    pub fn building_number(&self) -> String {
        let mut number = String::new();
        if self.is_basement == BASEMENT {
            number.push_str(BASEMENT_MARKER);
            number.push(' ');
        }
        number.push_str(&self.building_main_no.to_string());
        if self.building_sub_no > 0 {
            number.push('-');
            number.push_str(&self.building_sub_no.to_string());
        }
        number
    }

    /// Stable identifier derived from the composite key.
    pub fn document_id(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}",
            self.address_management_no,
            self.road_name_code,
            self.is_basement,
            self.building_main_no,
            self.building_sub_no
        )
    }
}

/// The entrance point of a building, as stored by the address database.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrance {
    /// Entrance X: easting on the national grid, or longitude.
    pub x: Option<f64>,
    /// Entrance Y: northing on the national grid, or latitude.
    pub y: Option<f64>,
}

impl Entrance {
    /// The entrance point tagged with the system its columns are stored in.
    /// `None` when either column is empty.
    pub fn coordinate(&self, system: CoordinateSystem) -> Option<Coordinate> {
        let (x, y) = (self.x?, self.y?);
        Some(match system {
            CoordinateSystem::Planar => Coordinate::Planar(PlanarCoordinate::new(x, y)),
            CoordinateSystem::Geodetic => Coordinate::Geodetic(GeodeticCoordinate::new(y, x)),
        })
    }
}

/// An address record joined with its (optional) entrance.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressWithEntrance {
    pub address: RoadNameAddress,
    pub entrance: Option<Entrance>,
}

/// Paginated read access to the address database.
///
/// Implementations must order records identically across calls so that
/// walking the pages neither skips nor repeats a record.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Read up to `limit` records starting at `offset`. An empty page means
    /// there are no more records.
    async fn page(&self, offset: u64, limit: u64) -> Result<Vec<AddressWithEntrance>, RebuildError>;
}
