//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `GeoIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use geocoder_shared::GeoDocument;
use opensearch::{
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetAliasParts,
        IndicesRefreshParts,
    },
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::GeoIndexError;
use crate::interfaces::GeoIndexProvider;
use crate::opensearch::index_config::{get_index_settings, get_nearest_query};
use crate::types::{
    AliasAction, BulkItemResult, BulkWriteSummary, GenerationSettings, NearestHit, NearestQuery,
};

/// OpenSearch provider implementation.
///
/// Works against OpenSearch and Elasticsearch-compatible clusters; it only uses
/// the bulk, index administration, alias and search endpoints.
///
/// # Example
///
/// ```ignore
/// let provider = OpenSearchProvider::new("http://localhost:9200").await?;
/// let exists = provider.index_exists("address_geo_1735689600").await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(GeoIndexError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, GeoIndexError> {
        let parsed_url = Url::parse(url).map_err(|e| GeoIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| GeoIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Check the cluster answers a ping.
    pub async fn ping(&self) -> Result<(), GeoIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| GeoIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            Ok(())
        } else {
            Err(GeoIndexError::connection(format!(
                "Ping failed with status {}",
                response.status_code()
            )))
        }
    }

    /// Build the NDJSON body of a bulk request: an `index` action line followed
    /// by the document source, for every document.
    fn bulk_body(documents: &[GeoDocument]) -> Result<Vec<JsonBody<Value>>, GeoIndexError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

        for doc in documents {
            let action = match &doc.document_id {
                Some(id) => json!({ "index": { "_id": id } }),
                None => json!({ "index": {} }),
            };
            let source = serde_json::to_value(doc)
                .map_err(|e| GeoIndexError::serialization(e.to_string()))?;

            body.push(action.into());
            body.push(source.into());
        }

        Ok(body)
    }

    /// Turn a bulk response body into per-document results.
    ///
    /// Items come back in submission order, one per action line.
    fn parse_bulk_response(
        body: &Value,
        expected: usize,
    ) -> Result<BulkWriteSummary, GeoIndexError> {
        let items = body["items"]
            .as_array()
            .ok_or_else(|| GeoIndexError::parse("Bulk response has no items array"))?;

        if items.len() != expected {
            return Err(GeoIndexError::parse(format!(
                "Bulk response has {} items, expected {}",
                items.len(),
                expected
            )));
        }

        let results = items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                // Each item is keyed by its action type ("index", "create", ...)
                let outcome = item
                    .as_object()
                    .and_then(|obj| obj.values().next())
                    .cloned()
                    .unwrap_or(Value::Null);

                let status = outcome["status"].as_u64().unwrap_or(0);
                let error = match &outcome["error"] {
                    Value::Null => None,
                    err => Some(
                        err["reason"]
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| err.to_string()),
                    ),
                };
                let success = error.is_none() && (200..300).contains(&status);

                BulkItemResult {
                    position,
                    success,
                    error: if success {
                        None
                    } else {
                        error.or_else(|| Some(format!("status {}", status)))
                    },
                }
            })
            .collect();

        Ok(BulkWriteSummary::from_results(results))
    }

    /// Index names from a get-alias response body (`{ "<index>": { "aliases": {..} } }`).
    fn parse_alias_targets(body: &Value) -> Result<Vec<String>, GeoIndexError> {
        let indices = body
            .as_object()
            .ok_or_else(|| GeoIndexError::parse("Alias response is not an object"))?;

        let mut names: Vec<String> = indices.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Hits from a search response body.
    fn parse_search_hits(body: &Value) -> Result<Vec<NearestHit>, GeoIndexError> {
        let hits = body["hits"]["hits"]
            .as_array()
            .ok_or_else(|| GeoIndexError::parse("Search response has no hits array"))?;

        hits.iter()
            .map(|hit| {
                let document: GeoDocument = serde_json::from_value(hit["_source"].clone())
                    .map_err(|e| GeoIndexError::parse(format!("Invalid hit source: {}", e)))?;
                let sort_distance = hit["sort"].get(0).and_then(Value::as_f64);

                Ok(NearestHit {
                    document,
                    sort_distance,
                })
            })
            .collect()
    }

    /// Convert alias actions into the `_aliases` request body.
    fn alias_actions_body(actions: &[AliasAction]) -> Value {
        let actions: Vec<Value> = actions
            .iter()
            .map(|action| match action {
                AliasAction::Add { index, alias } => {
                    json!({ "add": { "index": index, "alias": alias } })
                }
                AliasAction::Remove { index, alias } => {
                    json!({ "remove": { "index": index, "alias": alias } })
                }
            })
            .collect();

        json!({ "actions": actions })
    }

    /// Read the body of a failed response for error reporting.
    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }
}

#[async_trait]
impl GeoIndexProvider for OpenSearchProvider {
    async fn index_exists(&self, index: &str) -> Result<bool, GeoIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| GeoIndexError::index_admin(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(GeoIndexError::index_admin(format!(
                "Exists check for {} failed with status {}",
                index, status
            ))),
        }
    }

    async fn create_index(
        &self,
        index: &str,
        settings: &GenerationSettings,
    ) -> Result<(), GeoIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(get_index_settings(settings))
            .send()
            .await
            .map_err(|e| GeoIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Create index request failed");
            return Err(GeoIndexError::index_creation(format!(
                "Create {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(
            index = %index,
            shards = settings.number_of_shards,
            replicas = settings.number_of_replicas,
            "Index created"
        );
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), GeoIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| GeoIndexError::index_admin(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(GeoIndexError::index_admin(format!(
                "Delete {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        debug!(index = %index, "Index deleted");
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> Result<(), GeoIndexError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| GeoIndexError::index_admin(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(GeoIndexError::index_admin(format!(
                "Refresh {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        debug!(index = %index, "Index refreshed");
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[GeoDocument],
    ) -> Result<BulkWriteSummary, GeoIndexError> {
        if documents.is_empty() {
            return Ok(BulkWriteSummary::from_results(vec![]));
        }

        let body = Self::bulk_body(documents)?;

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| GeoIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(index = %index, status = %status, body = %error_body, "Bulk request failed");
            return Err(GeoIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GeoIndexError::parse(e.to_string()))?;

        Self::parse_bulk_response(&body, documents.len())
    }

    async fn get_alias_targets(&self, alias: &str) -> Result<Vec<String>, GeoIndexError> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(|e| GeoIndexError::alias(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            // Alias does not exist yet
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(GeoIndexError::alias(format!(
                "Get alias {} failed with status {}: {}",
                alias, status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GeoIndexError::parse(e.to_string()))?;

        Self::parse_alias_targets(&body)
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), GeoIndexError> {
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(Self::alias_actions_body(actions))
            .send()
            .await
            .map_err(|e| GeoIndexError::alias(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Alias update request failed");
            return Err(GeoIndexError::alias(format!(
                "Alias update failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(action_count = actions.len(), "Aliases updated");
        Ok(())
    }

    async fn search_nearest(
        &self,
        target: &str,
        query: &NearestQuery,
    ) -> Result<Vec<NearestHit>, GeoIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[target]))
            .body(get_nearest_query(query))
            .send()
            .await
            .map_err(|e| GeoIndexError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(GeoIndexError::search(format!(
                "Search on {} failed with status {}: {}",
                target, status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| GeoIndexError::parse(e.to_string()))?;

        Self::parse_search_hits(&body)
    }
}
