//! Configuration read from the environment, and dependency wiring.

mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Datelike, Utc};
use geocoder_repository::{BulkLoadConfig, IndexSettings};
use geocoder_shared::CoordinateSystem;
use tracing::warn;

use crate::errors::RebuildError;
use crate::job::{ExtractPeriod, DEFAULT_PAGE_SIZE};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default address database URL.
const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/geocoder";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection on a fixed interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Anything else falls back to "retry".
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("retry").to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            other => {
                warn!(value = %other, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Everything the rebuild binary needs to run.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub opensearch_url: String,
    pub database_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub index: IndexSettings,
    pub bulk: BulkLoadConfig,
    pub page_size: u64,
    /// System the entrance X/Y columns are stored in.
    pub entrance_system: CoordinateSystem,
    pub period: ExtractPeriod,
}

impl GeocoderConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `DATABASE_URL`: Address database URL
    /// - `INDEX_ALIAS`: Alias served to queries (default: "address_geo")
    /// - `INDEX_SHARDS` / `INDEX_REPLICAS`: Generation settings (default: 1 / 1)
    /// - `BULK_BATCH_SIZE`: Documents per bulk request and records per page (default: 2000)
    /// - `ENTRANCE_COORD_SYSTEM`: "PLANAR" or "GEODETIC" (default: PLANAR)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `REBUILD_YEAR` / `REBUILD_MONTH`: Extract period (default: current month)
    pub fn from_env() -> Result<Self, RebuildError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RebuildError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let opensearch_url =
            lookup("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string());
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let connection_mode = ConnectionMode::parse(lookup("OPENSEARCH_CONNECTION_MODE").as_deref());
        let retry_interval = Duration::from_secs(parse_or(
            &lookup,
            "OPENSEARCH_RETRY_INTERVAL_SECS",
            DEFAULT_RETRY_INTERVAL_SECS,
        ));

        let mut index = match lookup("INDEX_ALIAS") {
            Some(alias) if !alias.trim().is_empty() => IndexSettings::with_alias(alias.trim()),
            _ => IndexSettings::default(),
        };
        index.number_of_shards = parse_or(&lookup, "INDEX_SHARDS", index.number_of_shards);
        index.number_of_replicas = parse_or(&lookup, "INDEX_REPLICAS", index.number_of_replicas);

        let batch_size = parse_or(&lookup, "BULK_BATCH_SIZE", DEFAULT_PAGE_SIZE as usize);
        let bulk = BulkLoadConfig::with_batch_size(batch_size);

        let entrance_system = match lookup("ENTRANCE_COORD_SYSTEM") {
            Some(value) => value.parse::<CoordinateSystem>().map_err(|e| {
                RebuildError::config(format!("ENTRANCE_COORD_SYSTEM: {}", e))
            })?,
            None => CoordinateSystem::Planar,
        };

        let now = Utc::now();
        let year = match lookup("REBUILD_YEAR") {
            Some(value) => value
                .trim()
                .parse::<i32>()
                .map_err(|_| RebuildError::validation(format!("REBUILD_YEAR is not a number: {}", value)))?,
            None => now.year(),
        };
        let month = lookup("REBUILD_MONTH").unwrap_or_else(|| format!("{:02}", now.month()));
        let period = ExtractPeriod::parse(year, &month)?;

        Ok(Self {
            opensearch_url,
            database_url,
            connection_mode,
            retry_interval,
            index,
            page_size: bulk.batch_size as u64,
            bulk,
            entrance_system,
            period,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %value, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
