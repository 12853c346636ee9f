//! Geocoder Main Entry Point
//!
//! Rebuilds the address geo index for one extract period and swaps it into
//! service.

use dotenv::dotenv;
use geocoder::{Dependencies, GeocoderConfig, RebuildError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("geocoder=info,geocoder_repository=info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();

        info!(
            service_name = "geocoder",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "geocoder",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), RebuildError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    let config = GeocoderConfig::from_env().inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;

    info!(period = %config.period, "Starting address index rebuild");

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.job.run(config.period).await {
        Ok(outcome) => {
            let report = &outcome.report;
            info!(
                generation = %report.generation.name,
                inserted = report.inserted,
                superseded = ?report.superseded,
                cleanup_failures = ?report.cleanup_failures,
                "Rebuild completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Rebuild failed");
            Err(e)
        }
    }
}
