//! Bulk loader for index generations.
//!
//! Streams documents into a named generation in fixed-size batches. Each batch
//! is one bulk request and the unit of retry: when the engine rejects any
//! document in it, the whole batch is resubmitted under a bounded
//! [`RetryPolicy`](crate::config::RetryPolicy). Batches are written one at a
//! time, so at most one batch is ever in doubt.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures::{stream, Stream, StreamExt};
use geocoder_shared::GeoDocument;
use tokio_retry::Retry;
use tracing::{debug, error, info, instrument, warn};

use crate::config::BulkLoadConfig;
use crate::errors::GeoIndexError;
use crate::interfaces::GeoIndexProvider;

/// Outcome of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Documents confirmed by the engine.
    pub inserted: usize,
    /// Bulk requests that were confirmed.
    pub batches: usize,
}

/// Why a single attempt at a batch did not confirm.
#[derive(Debug)]
struct BatchFailure {
    unconfirmed: usize,
    cause: GeoIndexError,
}

/// Loader that writes documents into an index generation.
///
/// The loader is responsible for:
/// - Splitting pages into batches of at most `batch_size` documents
/// - Retrying a failed batch as a whole, with linear backoff
/// - Failing the load when a batch exhausts its attempts
pub struct BulkLoader {
    provider: Arc<dyn GeoIndexProvider>,
    config: BulkLoadConfig,
}

impl BulkLoader {
    /// Create a new bulk loader with the default configuration.
    pub fn new(provider: Arc<dyn GeoIndexProvider>) -> Self {
        Self {
            provider,
            config: BulkLoadConfig::default(),
        }
    }

    /// Create a new bulk loader with custom configuration.
    ///
    /// A batch size of zero is raised to one.
    pub fn with_config(provider: Arc<dyn GeoIndexProvider>, mut config: BulkLoadConfig) -> Self {
        config.batch_size = config.batch_size.max(1);
        Self { provider, config }
    }

    pub fn config(&self) -> &BulkLoadConfig {
        &self.config
    }

    /// Load a stream of document pages into `generation`.
    ///
    /// Pages are consumed lazily, one at a time. Empty pages are skipped; the
    /// stream's end finishes the load. A page larger than the batch size is
    /// split into several batches.
    ///
    /// Documents become searchable only after the generation is refreshed.
    ///
    /// # Returns
    ///
    /// * `Ok(LoadReport)` - Every batch was confirmed
    /// * `Err(GeoIndexError::OperationFailed)` - A batch exhausted its retries;
    ///   batches confirmed before it stay written and are not rolled back
    /// * `Err(GeoIndexError)` - The page stream itself failed
    #[instrument(skip(self, pages))]
    pub async fn load_generation<S>(
        &self,
        generation: &str,
        pages: S,
    ) -> Result<LoadReport, GeoIndexError>
    where
        S: Stream<Item = Result<Vec<GeoDocument>, GeoIndexError>> + Send,
    {
        let mut pages = Box::pin(pages);
        let mut report = LoadReport::default();
        let mut page_number = 0usize;

        while let Some(page) = pages.next().await {
            let page = page?;
            page_number += 1;

            if page.is_empty() {
                debug!(page = page_number, "Skipping page without documents");
                continue;
            }

            for batch in page.chunks(self.config.batch_size) {
                let inserted = self.write_batch(generation, batch).await?;
                report.inserted += inserted;
                report.batches += 1;
            }

            info!(
                page = page_number,
                inserted_total = report.inserted,
                batches = report.batches,
                "Loaded page"
            );
        }

        info!(
            inserted = report.inserted,
            batches = report.batches,
            "Bulk load completed"
        );
        Ok(report)
    }

    /// Load an in-memory sequence of documents, batching it by `batch_size`.
    pub async fn load_documents(
        &self,
        generation: &str,
        documents: Vec<GeoDocument>,
    ) -> Result<LoadReport, GeoIndexError> {
        let batch_size = self.config.batch_size;
        let pages: Vec<Result<Vec<GeoDocument>, GeoIndexError>> = documents
            .chunks(batch_size)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();

        self.load_generation(generation, stream::iter(pages)).await
    }

    /// Write one batch, retrying the whole batch until it is confirmed or the
    /// retry policy is exhausted.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of documents confirmed (the batch length)
    /// * `Err(GeoIndexError::OperationFailed)` - Carries the number of documents
    ///   still unconfirmed after the last attempt and its cause
    pub async fn write_batch(
        &self,
        generation: &str,
        batch: &[GeoDocument],
    ) -> Result<usize, GeoIndexError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let attempts = AtomicU32::new(0);
        let result = Retry::spawn(self.config.retry.backoff(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.submit(generation, batch, attempt)
        })
        .await;

        result.map_err(|failure| {
            error!(
                generation = %generation,
                batch_size = batch.len(),
                attempts = attempts.load(Ordering::SeqCst),
                unconfirmed = failure.unconfirmed,
                error = %failure.cause,
                "Batch failed after exhausting retries"
            );
            GeoIndexError::operation_failed(failure.unconfirmed, failure.cause.to_string())
        })
    }

    /// One attempt at a batch.
    async fn submit(
        &self,
        generation: &str,
        batch: &[GeoDocument],
        attempt: u32,
    ) -> Result<usize, BatchFailure> {
        let retry = &self.config.retry;
        let will_retry = attempt < retry.max_attempts;

        let failure = match self.provider.bulk_index(generation, batch).await {
            Ok(summary) if !summary.has_failures() => {
                debug!(attempt = attempt, count = summary.succeeded, "Batch confirmed");
                return Ok(batch.len());
            }
            Ok(summary) => {
                for item in summary.failures() {
                    warn!(
                        position = item.position,
                        reason = item.error.as_deref().unwrap_or("unknown"),
                        "Document rejected by bulk write"
                    );
                }
                BatchFailure {
                    unconfirmed: summary.failed,
                    cause: GeoIndexError::bulk_index(format!(
                        "{} of {} documents failed",
                        summary.failed, summary.total
                    )),
                }
            }
            Err(e) => BatchFailure {
                unconfirmed: batch.len(),
                cause: e,
            },
        };

        if will_retry {
            warn!(
                attempt = attempt,
                max_attempts = retry.max_attempts,
                unconfirmed = failure.unconfirmed,
                retry_in_ms = retry.delay_after(attempt).as_millis() as u64,
                error = %failure.cause,
                "Bulk write failed, retrying batch"
            );
        }

        Err(failure)
    }
}
