//! In-memory search engine used by the integration tests.
//!
//! Models what the lifecycle depends on: documents become visible only after
//! a refresh, alias updates apply all-or-nothing, searching an unknown name
//! fails. Individual operations can be made to fail.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use geocoder_repository::{
    AliasAction, BulkItemResult, BulkWriteSummary, GenerationSettings, GeoIndexError,
    GeoIndexProvider, NearestHit, NearestQuery,
};
use geocoder_shared::{haversine_distance, GeoDocument, GeodeticCoordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    Succeed,
    /// Reject the first `n` documents of the batch.
    Reject(usize),
    TransportError,
}

#[derive(Debug, Default)]
struct Index {
    settings: Option<GenerationSettings>,
    /// Searchable documents, keyed by id (or insertion slot for id-less documents).
    visible: BTreeMap<String, GeoDocument>,
    pending: BTreeMap<String, GeoDocument>,
    next_slot: usize,
}

#[derive(Debug, Default)]
struct Engine {
    indices: BTreeMap<String, Index>,
    aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Default)]
pub struct InMemoryProvider {
    engine: Mutex<Engine>,
    bulk_script: Mutex<Vec<BulkOutcome>>,
    bulk_calls: Mutex<usize>,
    fail_create: Mutex<bool>,
    fail_alias_update: Mutex<bool>,
    fail_delete: Mutex<HashSet<String>>,
    alias_updates: Mutex<Vec<Vec<AliasAction>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play back these outcomes for the next bulk calls, then succeed.
    pub fn script_bulk(&self, outcomes: Vec<BulkOutcome>) {
        *self.bulk_script.lock().unwrap() = outcomes;
    }

    pub fn fail_create(&self) {
        *self.fail_create.lock().unwrap() = true;
    }

    pub fn fail_alias_update(&self) {
        *self.fail_alias_update.lock().unwrap() = true;
    }

    pub fn fail_delete_of(&self, index: &str) {
        self.fail_delete.lock().unwrap().insert(index.to_string());
    }

    /// Create an index directly, bypassing the provider API.
    pub fn seed_index(&self, name: &str, documents: Vec<GeoDocument>) {
        let mut engine = self.engine.lock().unwrap();
        let index = engine.indices.entry(name.to_string()).or_default();
        for doc in documents {
            let key = Self::key(index, &doc);
            index.visible.insert(key, doc);
        }
    }

    pub fn seed_alias(&self, alias: &str, indices: &[&str]) {
        self.engine.lock().unwrap().aliases.insert(
            alias.to_string(),
            indices.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn index_names(&self) -> Vec<String> {
        self.engine.lock().unwrap().indices.keys().cloned().collect()
    }

    pub fn alias_targets(&self, alias: &str) -> Vec<String> {
        self.engine
            .lock()
            .unwrap()
            .aliases
            .get(alias)
            .cloned()
            .unwrap_or_default()
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.engine
            .lock()
            .unwrap()
            .indices
            .get(index)
            .map(|i| i.visible.len() + i.pending.len())
            .unwrap_or(0)
    }

    pub fn bulk_calls(&self) -> usize {
        *self.bulk_calls.lock().unwrap()
    }

    pub fn alias_updates(&self) -> Vec<Vec<AliasAction>> {
        self.alias_updates.lock().unwrap().clone()
    }

    fn key(index: &mut Index, doc: &GeoDocument) -> String {
        match &doc.document_id {
            Some(id) => id.clone(),
            None => {
                index.next_slot += 1;
                format!("_slot_{}", index.next_slot)
            }
        }
    }
}

#[async_trait]
impl GeoIndexProvider for InMemoryProvider {
    async fn index_exists(&self, index: &str) -> Result<bool, GeoIndexError> {
        Ok(self.engine.lock().unwrap().indices.contains_key(index))
    }

    async fn create_index(
        &self,
        index: &str,
        settings: &GenerationSettings,
    ) -> Result<(), GeoIndexError> {
        if *self.fail_create.lock().unwrap() {
            return Err(GeoIndexError::index_creation("cluster_block_exception"));
        }

        let mut engine = self.engine.lock().unwrap();
        if engine.indices.contains_key(index) || engine.aliases.contains_key(index) {
            return Err(GeoIndexError::index_creation(format!(
                "resource_already_exists_exception: {}",
                index
            )));
        }
        engine.indices.insert(
            index.to_string(),
            Index {
                settings: Some(settings.clone()),
                ..Index::default()
            },
        );
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), GeoIndexError> {
        if self.fail_delete.lock().unwrap().contains(index) {
            return Err(GeoIndexError::index_admin(format!("cannot delete {}", index)));
        }

        let mut engine = self.engine.lock().unwrap();
        engine
            .indices
            .remove(index)
            .ok_or_else(|| GeoIndexError::index_admin(format!("index_not_found: {}", index)))?;
        for targets in engine.aliases.values_mut() {
            targets.retain(|t| t != index);
        }
        Ok(())
    }

    async fn refresh_index(&self, index: &str) -> Result<(), GeoIndexError> {
        let mut engine = self.engine.lock().unwrap();
        let index = engine
            .indices
            .get_mut(index)
            .ok_or_else(|| GeoIndexError::index_admin(format!("index_not_found: {}", index)))?;
        let pending = std::mem::take(&mut index.pending);
        index.visible.extend(pending);
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        documents: &[GeoDocument],
    ) -> Result<BulkWriteSummary, GeoIndexError> {
        *self.bulk_calls.lock().unwrap() += 1;

        let outcome = {
            let mut script = self.bulk_script.lock().unwrap();
            if script.is_empty() {
                BulkOutcome::Succeed
            } else {
                script.remove(0)
            }
        };

        let rejected = match outcome {
            BulkOutcome::TransportError => {
                return Err(GeoIndexError::bulk_index("connection reset by peer"))
            }
            BulkOutcome::Succeed => 0,
            BulkOutcome::Reject(n) => n,
        };

        let mut engine = self.engine.lock().unwrap();
        let target = engine
            .indices
            .get_mut(index)
            .ok_or_else(|| GeoIndexError::bulk_index(format!("index_not_found: {}", index)))?;

        let results = documents
            .iter()
            .enumerate()
            .map(|(position, doc)| {
                if position < rejected {
                    return BulkItemResult {
                        position,
                        success: false,
                        error: Some("es_rejected_execution_exception".to_string()),
                    };
                }
                let key = InMemoryProvider::key(target, doc);
                target.pending.insert(key, doc.clone());
                BulkItemResult {
                    position,
                    success: true,
                    error: None,
                }
            })
            .collect();

        Ok(BulkWriteSummary::from_results(results))
    }

    async fn get_alias_targets(&self, alias: &str) -> Result<Vec<String>, GeoIndexError> {
        Ok(self.alias_targets(alias))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), GeoIndexError> {
        if *self.fail_alias_update.lock().unwrap() {
            return Err(GeoIndexError::alias("alias update rejected"));
        }

        let mut engine = self.engine.lock().unwrap();

        // Validate everything before touching state
        for action in actions {
            match action {
                AliasAction::Add { index, .. } if !engine.indices.contains_key(index) => {
                    return Err(GeoIndexError::alias(format!("index_not_found: {}", index)));
                }
                AliasAction::Remove { index, alias }
                    if !engine
                        .aliases
                        .get(alias)
                        .is_some_and(|targets| targets.contains(index)) =>
                {
                    return Err(GeoIndexError::alias(format!(
                        "aliases_not_found: {} on {}",
                        alias, index
                    )));
                }
                _ => {}
            }
        }

        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    let targets = engine.aliases.entry(alias.clone()).or_default();
                    if !targets.contains(index) {
                        targets.push(index.clone());
                    }
                }
                AliasAction::Remove { index, alias } => {
                    if let Some(targets) = engine.aliases.get_mut(alias) {
                        targets.retain(|t| t != index);
                    }
                }
            }
        }
        engine.aliases.retain(|_, targets| !targets.is_empty());

        self.alias_updates.lock().unwrap().push(actions.to_vec());
        Ok(())
    }

    async fn search_nearest(
        &self,
        target: &str,
        query: &NearestQuery,
    ) -> Result<Vec<NearestHit>, GeoIndexError> {
        let engine = self.engine.lock().unwrap();

        let indices: Vec<&Index> = match engine.aliases.get(target) {
            Some(names) => names.iter().filter_map(|n| engine.indices.get(n)).collect(),
            None => match engine.indices.get(target) {
                Some(index) => vec![index],
                None => {
                    return Err(GeoIndexError::search(format!(
                        "index_not_found_exception: {}",
                        target
                    )))
                }
            },
        };

        let origin = GeodeticCoordinate::new(query.lat, query.lon);
        let mut hits: Vec<NearestHit> = indices
            .iter()
            .flat_map(|index| index.visible.values())
            .map(|doc| NearestHit {
                document: doc.clone(),
                sort_distance: Some(haversine_distance(origin, doc.location)),
            })
            .filter(|hit| hit.sort_distance.unwrap_or(f64::MAX) <= query.radius_meters)
            .collect();

        hits.sort_by(|a, b| {
            a.sort_distance
                .partial_cmp(&b.sort_distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.size);
        Ok(hits)
    }
}

pub fn seoul_city_hall() -> GeoDocument {
    GeoDocument::new(
        "서울특별시 중구 태평로1가 세종대로 110",
        GeodeticCoordinate::new(37.5663, 126.9779),
    )
    .with_id("1114010300-110")
}

pub fn busan_city_hall() -> GeoDocument {
    GeoDocument::new(
        "부산광역시 연제구 연산동 중앙대로 1001",
        GeodeticCoordinate::new(35.1796, 129.0756),
    )
    .with_id("2647010200-1001")
}

/// `n` distinct documents spread over a small area of Seoul.
pub fn grid_documents(n: usize) -> Vec<GeoDocument> {
    (0..n)
        .map(|i| {
            GeoDocument::new(
                format!("서울특별시 테스트로 {}", i + 1),
                GeodeticCoordinate::new(37.50 + (i % 100) as f64 * 1e-4, 127.00 + (i / 100) as f64 * 1e-4),
            )
            .with_id(format!("grid-{}", i))
        })
        .collect()
}
