//! Reverse geocoding service.
//!
//! This is the entry point application code uses to turn a coordinate into
//! the nearest street address.

use std::sync::Arc;

use geocoder_shared::{
    AddressMatch, Coordinate, CoordinateSystem, CoordinateTransformer, GeodeticCoordinate,
};
use tracing::{debug, instrument};

use crate::config::QueryConfig;
use crate::errors::GeoIndexError;
use crate::interfaces::GeoIndexProvider;
use crate::query::NearestAddressQuery;

/// Reverse geocoding over the live address alias.
///
/// Validates and normalises the input coordinate, then delegates the lookup
/// to [`NearestAddressQuery`]. Bad input is an error; a failing or empty
/// index is "no address".
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use geocoder_repository::{OpenSearchProvider, ReverseGeocodeService};
/// use geocoder_shared::CoordinateSystem;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(OpenSearchProvider::new("http://localhost:9200").await?);
/// let service = ReverseGeocodeService::new(provider, "address_geo");
///
/// if let Some(found) = service
///     .reverse_geocode(37.5665, 126.9780, CoordinateSystem::Geodetic)
///     .await?
/// {
///     println!("{} ({} m)", found.full_address, found.mapping_distance());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ReverseGeocodeService {
    query: NearestAddressQuery,
    transformer: CoordinateTransformer,
}

impl ReverseGeocodeService {
    pub fn new(provider: Arc<dyn GeoIndexProvider>, alias: impl Into<String>) -> Self {
        Self::with_config(
            provider,
            alias,
            QueryConfig::default(),
            CoordinateTransformer::default(),
        )
    }

    pub fn with_config(
        provider: Arc<dyn GeoIndexProvider>,
        alias: impl Into<String>,
        config: QueryConfig,
        transformer: CoordinateTransformer,
    ) -> Self {
        Self {
            query: NearestAddressQuery::with_config(provider, alias, config),
            transformer,
        }
    }

    /// Find the nearest address to a point.
    ///
    /// For planar input the `lat` slot carries the grid X (easting) and the
    /// `lon` slot the grid Y (northing).
    ///
    /// # Returns
    ///
    /// * `Ok(Some(AddressMatch))` - An address lies within the search radius
    /// * `Ok(None)` - Nothing within the radius, or the index is unavailable
    /// * `Err(GeoIndexError::ValidationError)` - The coordinate is invalid or
    ///   cannot be transformed
    #[instrument(skip(self))]
    pub async fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
        coord_type: CoordinateSystem,
    ) -> Result<Option<AddressMatch>, GeoIndexError> {
        let point = self.resolve(Coordinate::from_lat_lon(lat, lon, coord_type))?;
        debug!(point = %point, "Resolved query point");
        Ok(self.query.find_nearest(point).await)
    }

    /// Like [`reverse_geocode`](Self::reverse_geocode), with the coordinate
    /// type given by name (e.g. `"WGS84"`, `"UTMK"`).
    pub async fn reverse_geocode_str(
        &self,
        lat: f64,
        lon: f64,
        coord_type: &str,
    ) -> Result<Option<AddressMatch>, GeoIndexError> {
        let coord_type: CoordinateSystem = coord_type.parse()?;
        self.reverse_geocode(lat, lon, coord_type).await
    }

    fn resolve(&self, coordinate: Coordinate) -> Result<GeodeticCoordinate, GeoIndexError> {
        match coordinate {
            Coordinate::Geodetic(point) if !point.is_valid() => Err(GeoIndexError::validation(
                format!("Invalid WGS84 coordinate: {}", point),
            )),
            other => Ok(self.transformer.to_geodetic(other)?),
        }
    }
}
