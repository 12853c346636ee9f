//! Blue/green lifecycle of the address index.
//!
//! A rebuild never writes into the generation that is being served. It creates
//! a fresh generation, loads it completely, then moves the alias in a single
//! atomic update. Queries observe either the old generation or the new one.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::Stream;
use geocoder_shared::GeoDocument;
use tracing::{error, info, instrument, warn};

use crate::bulk_loader::{BulkLoader, LoadReport};
use crate::config::{BulkLoadConfig, IndexSettings};
use crate::errors::GeoIndexError;
use crate::interfaces::GeoIndexProvider;
use crate::types::{AliasAction, IndexGeneration};

/// Steps of a rebuild. `Failed` can be entered from any step before `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    Start,
    CheckExists,
    CreateGeneration,
    BulkLoad,
    SwapAlias,
    Cleanup,
    Done,
    Failed,
}

impl fmt::Display for RebuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebuildState::Start => "START",
            RebuildState::CheckExists => "CHECK_EXISTS",
            RebuildState::CreateGeneration => "CREATE_GENERATION",
            RebuildState::BulkLoad => "BULK_LOAD",
            RebuildState::SwapAlias => "SWAP_ALIAS",
            RebuildState::Cleanup => "CLEANUP",
            RebuildState::Done => "DONE",
            RebuildState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Summary of a successful rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildReport {
    /// The generation the alias now points at.
    pub generation: IndexGeneration,
    pub inserted: usize,
    pub batches: usize,
    /// Generations the alias pointed at before the swap.
    pub superseded: Vec<String>,
    /// Superseded generations whose deletion failed. They are left behind
    /// unreferenced and do not affect queries.
    pub cleanup_failures: Vec<String>,
}

/// Actions that move `alias` from `previous` generations to `next`.
///
/// Removals come first; the list is applied as one atomic update so the order
/// only matters for readability of the request.
pub fn alias_swap_actions(alias: &str, next: &str, previous: &[String]) -> Vec<AliasAction> {
    previous
        .iter()
        .filter(|index| index.as_str() != next)
        .map(|index| AliasAction::Remove {
            index: index.clone(),
            alias: alias.to_string(),
        })
        .chain(std::iter::once(AliasAction::Add {
            index: next.to_string(),
            alias: alias.to_string(),
        }))
        .collect()
}

/// Drives a rebuild from generation creation to cleanup.
pub struct IndexLifecycleManager {
    provider: Arc<dyn GeoIndexProvider>,
    settings: IndexSettings,
    loader: BulkLoader,
}

impl IndexLifecycleManager {
    pub fn new(
        provider: Arc<dyn GeoIndexProvider>,
        settings: IndexSettings,
        bulk: BulkLoadConfig,
    ) -> Self {
        let loader = BulkLoader::with_config(provider.clone(), bulk);
        Self {
            provider,
            settings,
            loader,
        }
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Rebuild the index from `pages`, naming the generation after the
    /// current time.
    pub async fn rebuild<S>(&self, pages: S) -> Result<RebuildReport, GeoIndexError>
    where
        S: Stream<Item = Result<Vec<GeoDocument>, GeoIndexError>> + Send,
    {
        self.rebuild_at(Utc::now(), pages).await
    }

    /// Rebuild the index from `pages` into the generation named for `created_at`.
    ///
    /// On any failure before the alias swap, the alias keeps pointing at the
    /// previous generation and the partially built one is left in place for
    /// inspection. A failure while deleting superseded generations is logged
    /// and reported, never returned as an error.
    ///
    /// # Errors
    ///
    /// * `DuplicateGeneration` - A generation with the same name already exists
    /// * `IndexCreationError` - The engine refused to create the generation
    /// * `OperationFailed` - A batch exhausted its retries
    /// * `GenerationMissing` / `AliasError` - The swap could not be applied
    #[instrument(skip(self, pages), fields(alias = %self.settings.alias))]
    pub async fn rebuild_at<S>(
        &self,
        created_at: DateTime<Utc>,
        pages: S,
    ) -> Result<RebuildReport, GeoIndexError>
    where
        S: Stream<Item = Result<Vec<GeoDocument>, GeoIndexError>> + Send,
    {
        let mut state = RebuildState::Start;

        match self.run(&mut state, created_at, pages).await {
            Ok(report) => {
                transition(&mut state, RebuildState::Done);
                info!(
                    generation = %report.generation.name,
                    inserted = report.inserted,
                    batches = report.batches,
                    superseded = report.superseded.len(),
                    cleanup_failures = report.cleanup_failures.len(),
                    "Rebuild completed"
                );
                Ok(report)
            }
            Err(e) => {
                error!(failed_in = %state, error = %e, "Rebuild failed");
                transition(&mut state, RebuildState::Failed);
                Err(e)
            }
        }
    }

    async fn run<S>(
        &self,
        state: &mut RebuildState,
        created_at: DateTime<Utc>,
        pages: S,
    ) -> Result<RebuildReport, GeoIndexError>
    where
        S: Stream<Item = Result<Vec<GeoDocument>, GeoIndexError>> + Send,
    {
        let generation = IndexGeneration {
            name: self.settings.generation_name(created_at.timestamp()),
            shard_count: self.settings.number_of_shards,
            replica_count: self.settings.number_of_replicas,
            created_at,
        };

        transition(state, RebuildState::CheckExists);
        self.ensure_new_generation(&generation.name).await?;

        transition(state, RebuildState::CreateGeneration);
        self.create_generation(&generation.name).await?;

        transition(state, RebuildState::BulkLoad);
        let LoadReport { inserted, batches } =
            self.loader.load_generation(&generation.name, pages).await?;
        self.provider.refresh_index(&generation.name).await?;

        transition(state, RebuildState::SwapAlias);
        let superseded = self.swap_alias(&generation.name).await?;

        transition(state, RebuildState::Cleanup);
        let cleanup_failures = self.cleanup(&superseded).await;

        Ok(RebuildReport {
            generation,
            inserted,
            batches,
            superseded,
            cleanup_failures,
        })
    }

    async fn ensure_new_generation(&self, name: &str) -> Result<(), GeoIndexError> {
        if name == self.settings.alias {
            return Err(GeoIndexError::validation(format!(
                "Generation name '{}' collides with the alias",
                name
            )));
        }

        if self.provider.index_exists(name).await? {
            return Err(GeoIndexError::duplicate_generation(name));
        }

        Ok(())
    }

    /// Create an empty generation with the geo mapping.
    pub async fn create_generation(&self, name: &str) -> Result<(), GeoIndexError> {
        self.provider
            .create_index(name, &self.settings.generation_settings())
            .await
            .map_err(|e| match e {
                GeoIndexError::IndexCreationError(_) => e,
                other => GeoIndexError::index_creation(format!("{}: {}", name, other)),
            })?;

        info!(generation = %name, "Created index generation");
        Ok(())
    }

    /// Point the alias at `new_generation`, detaching it from every other
    /// generation in one atomic update.
    ///
    /// An alias that does not exist yet is created (first deployment).
    ///
    /// # Returns
    ///
    /// The generations the alias was detached from.
    pub async fn swap_alias(&self, new_generation: &str) -> Result<Vec<String>, GeoIndexError> {
        let alias = &self.settings.alias;

        if !self.provider.index_exists(new_generation).await? {
            return Err(GeoIndexError::generation_missing(new_generation));
        }

        let previous: Vec<String> = self
            .provider
            .get_alias_targets(alias)
            .await?
            .into_iter()
            .filter(|index| index != new_generation)
            .collect();

        if previous.is_empty() {
            info!(alias = %alias, generation = %new_generation, "Alias has no targets, attaching first generation");
        } else if previous.len() > 1 {
            warn!(alias = %alias, targets = ?previous, "Alias pointed at more than one generation");
        }

        let actions = alias_swap_actions(alias, new_generation, &previous);
        self.provider.update_aliases(&actions).await?;

        info!(
            alias = %alias,
            generation = %new_generation,
            previous = ?previous,
            "Alias swapped"
        );
        Ok(previous)
    }

    /// Delete superseded generations. Returns the ones that could not be deleted.
    pub async fn cleanup(&self, superseded: &[String]) -> Vec<String> {
        let mut failures = Vec::new();

        for index in superseded {
            match self.provider.delete_index(index).await {
                Ok(()) => info!(generation = %index, "Deleted superseded generation"),
                Err(e) => {
                    warn!(generation = %index, error = %e, "Failed to delete superseded generation");
                    failures.push(index.clone());
                }
            }
        }

        failures
    }
}

fn transition(state: &mut RebuildState, next: RebuildState) {
    info!(from = %state, to = %next, "Rebuild state");
    *state = next;
}
