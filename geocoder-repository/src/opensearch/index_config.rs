//! OpenSearch index configuration, mappings and query bodies.
//!
//! This module defines the index settings and mappings for an address index
//! generation, and the geo query used to find the nearest address.

use serde_json::{json, Value};

use crate::types::{GenerationSettings, NearestQuery};

/// Name of the full-text address field.
pub const FULL_ADDRESS_FIELD: &str = "fullAddress";

/// Name of the geo-point field.
pub const LOCATION_FIELD: &str = "location";

/// Get the index settings and mappings for an address index generation.
///
/// The mapping is fixed:
/// - **fullAddress**: `text`
/// - **location**: `geo_point`
///
/// Shard and replica counts come from `settings`.
pub fn get_index_settings(settings: &GenerationSettings) -> Value {
    json!({
        "settings": {
            "number_of_shards": settings.number_of_shards,
            "number_of_replicas": settings.number_of_replicas
        },
        "mappings": {
            "properties": {
                FULL_ADDRESS_FIELD: {
                    "type": "text"
                },
                LOCATION_FIELD: {
                    "type": "geo_point"
                }
            }
        }
    })
}

/// Build the search body for a bounded nearest-neighbour query.
///
/// A `geo_distance` filter limits candidates to the radius and a
/// `_geo_distance` sort orders them nearest first, in meters.
pub fn get_nearest_query(query: &NearestQuery) -> Value {
    let point = json!({ "lat": query.lat, "lon": query.lon });

    json!({
        "size": query.size,
        "query": {
            "bool": {
                "filter": {
                    "geo_distance": {
                        "distance": format!("{}m", query.radius_meters),
                        LOCATION_FIELD: point
                    }
                }
            }
        },
        "sort": [
            {
                "_geo_distance": {
                    LOCATION_FIELD: point,
                    "order": "asc",
                    "unit": "m",
                    "distance_type": "arc"
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings(&GenerationSettings {
            number_of_shards: 3,
            number_of_replicas: 2,
        });

        assert_eq!(settings["settings"]["number_of_shards"], 3);
        assert_eq!(settings["settings"]["number_of_replicas"], 2);

        let properties = settings["mappings"]["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 2);
        assert_eq!(properties["fullAddress"]["type"], "text");
        assert_eq!(properties["location"]["type"], "geo_point");
    }

    #[test]
    fn test_nearest_query_structure() {
        let body = get_nearest_query(&NearestQuery {
            lat: 37.5665,
            lon: 126.978,
            radius_meters: 1000.0,
            size: 1,
        });

        assert_eq!(body["size"], 1);

        let filter = &body["query"]["bool"]["filter"]["geo_distance"];
        assert_eq!(filter["distance"], "1000m");
        assert_eq!(filter["location"]["lat"], 37.5665);
        assert_eq!(filter["location"]["lon"], 126.978);

        let sort = &body["sort"][0]["_geo_distance"];
        assert_eq!(sort["order"], "asc");
        assert_eq!(sort["unit"], "m");
        assert_eq!(sort["location"]["lat"], 37.5665);
    }

    #[test]
    fn test_nearest_query_fractional_radius() {
        let body = get_nearest_query(&NearestQuery {
            lat: 0.0,
            lon: 0.0,
            radius_meters: 250.5,
            size: 1,
        });
        assert_eq!(body["query"]["bool"]["filter"]["geo_distance"]["distance"], "250.5m");
    }
}
