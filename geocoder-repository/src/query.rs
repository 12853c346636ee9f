//! Nearest-address lookup against the live index alias.

use std::sync::Arc;

use geocoder_shared::{haversine_distance, AddressMatch, GeodeticCoordinate};
use tracing::{debug, error, instrument};

use crate::config::QueryConfig;
use crate::errors::GeoIndexError;
use crate::interfaces::GeoIndexProvider;
use crate::types::NearestQuery;

/// Finds the closest indexed address to a WGS84 point.
///
/// Queries always go through the alias, never a concrete generation, so a
/// query issued during an alias swap sees one generation or the other.
pub struct NearestAddressQuery {
    provider: Arc<dyn GeoIndexProvider>,
    alias: String,
    config: QueryConfig,
}

impl NearestAddressQuery {
    pub fn new(provider: Arc<dyn GeoIndexProvider>, alias: impl Into<String>) -> Self {
        Self::with_config(provider, alias, QueryConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn GeoIndexProvider>,
        alias: impl Into<String>,
        config: QueryConfig,
    ) -> Self {
        Self {
            provider,
            alias: alias.into(),
            config,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Find the nearest address within the configured radius.
    ///
    /// Engine failures are logged and reported as "not found"; callers that
    /// need to tell the two apart use [`try_find_nearest`](Self::try_find_nearest).
    pub async fn find_nearest(&self, point: GeodeticCoordinate) -> Option<AddressMatch> {
        match self.try_find_nearest(point).await {
            Ok(found) => found,
            Err(e) => {
                error!(alias = %self.alias, point = %point, error = %e, "Nearest-address query failed");
                None
            }
        }
    }

    /// Find the nearest address within the configured radius.
    ///
    /// The returned distance is recomputed with the haversine formula from the
    /// query point to the stored location; the engine's sort value only picks
    /// the candidate.
    #[instrument(skip(self), fields(alias = %self.alias))]
    pub async fn try_find_nearest(
        &self,
        point: GeodeticCoordinate,
    ) -> Result<Option<AddressMatch>, GeoIndexError> {
        let query = NearestQuery {
            lat: point.lat,
            lon: point.lon,
            radius_meters: self.config.radius_meters,
            size: 1,
        };

        let hits = self.provider.search_nearest(&self.alias, &query).await?;
        let Some(hit) = hits.into_iter().next() else {
            debug!(point = %point, "No address within radius");
            return Ok(None);
        };

        let location = hit.document.location;
        let distance_meters = haversine_distance(point, location);
        debug!(
            full_address = %hit.document.full_address,
            distance_meters = distance_meters,
            sort_distance = ?hit.sort_distance,
            "Nearest address found"
        );

        Ok(Some(AddressMatch {
            full_address: hit.document.full_address,
            location,
            distance_meters,
        }))
    }
}
