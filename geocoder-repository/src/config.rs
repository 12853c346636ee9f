//! Configuration types for the geocoder components.
//!
//! Every component receives its configuration by value at construction; there
//! is no global state.

use std::time::Duration;

use crate::types::GenerationSettings;

/// Default alias the query engine always targets.
pub const DEFAULT_ALIAS: &str = "address_geo";

/// Configuration of the address index and its generations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Alias that points at the live generation.
    pub alias: String,
    /// Prefix of generation names; the creation epoch seconds are appended.
    pub generation_prefix: String,
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            generation_prefix: DEFAULT_ALIAS.to_string(),
            number_of_shards: 1,
            number_of_replicas: 1,
        }
    }
}

impl IndexSettings {
    /// Create settings for a custom alias, using it as the generation prefix too.
    pub fn with_alias(alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            generation_prefix: alias.clone(),
            alias,
            ..Self::default()
        }
    }

    /// Generation name for a creation time in epoch seconds.
    ///
    /// Two rebuilds started within the same second produce the same name; the
    /// lifecycle manager treats that as a duplicate generation.
    ///
    /// # Example
    ///
    /// ```
    /// use geocoder_repository::IndexSettings;
    ///
    /// let settings = IndexSettings::default();
    /// assert_eq!(settings.generation_name(1735689600), "address_geo_1735689600");
    /// ```
    pub fn generation_name(&self, epoch_seconds: i64) -> String {
        format!("{}_{}", self.generation_prefix, epoch_seconds)
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            number_of_shards: self.number_of_shards,
            number_of_replicas: self.number_of_replicas,
        }
    }
}

/// Bounded retry policy with linear backoff.
///
/// The delay before attempt `n + 1` is `n * base_delay`, so with the defaults
/// (3 attempts, 1s base) a batch waits 1s and then 2s before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Delays between consecutive attempts, usable as a `tokio_retry` strategy.
    pub fn backoff(&self) -> impl Iterator<Item = Duration> {
        let policy = *self;
        (1..policy.max_attempts).map(move |attempt| policy.delay_after(attempt))
    }

    /// Sum of all delays if every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        self.backoff().sum()
    }
}

/// Configuration for the bulk loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLoadConfig {
    /// Maximum number of documents in one bulk request.
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for BulkLoadConfig {
    fn default() -> Self {
        Self {
            batch_size: 2000,
            retry: RetryPolicy::default(),
        }
    }
}

impl BulkLoadConfig {
    /// Create a config with a custom batch size and the default retry policy.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            ..Self::default()
        }
    }
}

/// Configuration for the nearest-address query engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    /// Radius of the geo-distance filter in meters.
    pub radius_meters: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            radius_meters: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_index_settings() {
        let settings = IndexSettings::default();
        assert_eq!(settings.alias, "address_geo");
        assert_eq!(settings.number_of_shards, 1);
        assert_eq!(settings.number_of_replicas, 1);
    }

    #[test]
    fn test_generation_name() {
        let settings = IndexSettings::with_alias("addresses");
        assert_eq!(settings.generation_name(42), "addresses_42");
        assert_eq!(settings.alias, "addresses");
    }

    #[test]
    fn test_default_retry_backoff() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = policy.backoff().collect();

        assert_eq!(
            delays,
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert_eq!(policy.total_backoff(), Duration::from_millis(3000));
    }

    #[test]
    fn test_retry_policy_minimum_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff().count(), 0);
        assert_eq!(RetryPolicy::no_retry().total_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_bulk_load_defaults() {
        let config = BulkLoadConfig::default();
        assert_eq!(config.batch_size, 2000);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(BulkLoadConfig::with_batch_size(0).batch_size, 1);
    }

    #[test]
    fn test_query_defaults() {
        assert_eq!(QueryConfig::default().radius_meters, 1000.0);
    }
}
