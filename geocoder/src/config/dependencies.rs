//! Dependency initialization and wiring for the rebuild job.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use geocoder_repository::{IndexLifecycleManager, OpenSearchProvider};
use geocoder_shared::CoordinateTransformer;

use super::{ConnectionMode, GeocoderConfig};
use crate::errors::RebuildError;
use crate::job::{DocumentBuilder, RebuildJob};
use crate::source::PostgresAddressSource;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured rebuild job ready to run.
    pub job: RebuildJob,
}

impl Dependencies {
    /// Connect to the search engine and the address database and wire the job.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(RebuildError)` - If initialization fails (only in fail-fast mode
    ///   for the search engine)
    pub async fn new(config: &GeocoderConfig) -> Result<Self, RebuildError> {
        info!(
            opensearch_url = %config.opensearch_url,
            index_alias = %config.index.alias,
            batch_size = config.bulk.batch_size,
            entrance_system = %config.entrance_system,
            connection_mode = ?config.connection_mode,
            retry_interval_secs = config.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let provider = Self::connect_to_opensearch(
            &config.opensearch_url,
            config.connection_mode,
            config.retry_interval,
        )
        .await?;

        info!("OpenSearch connection established");

        let source = PostgresAddressSource::new(&config.database_url)
            .await
            .map_err(|e| RebuildError::config(format!("Failed to connect to address database: {}", e)))?;

        info!("Address database connection established");

        let lifecycle = IndexLifecycleManager::new(
            Arc::new(provider),
            config.index.clone(),
            config.bulk.clone(),
        );
        let builder = DocumentBuilder::new(CoordinateTransformer::default(), config.entrance_system);
        let job = RebuildJob::new(Arc::new(source), lifecycle, builder).with_page_size(config.page_size);

        Ok(Self { job })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, RebuildError> {
        loop {
            match Self::try_connect_opensearch(url).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(RebuildError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Create the provider and check the cluster answers.
    async fn try_connect_opensearch(url: &str) -> Result<OpenSearchProvider, RebuildError> {
        let provider = OpenSearchProvider::new(url).await?;
        provider.ping().await?;
        Ok(provider)
    }
}
