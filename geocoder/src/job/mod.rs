//! The rebuild job: read every address record, build documents and swap a
//! fresh index generation into service.

mod documents;

pub use documents::{
    build_page, document_pages, DocumentBuilder, ProductionStats, ProductionSummary,
    RecordOutcome,
};

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geocoder_repository::{IndexLifecycleManager, RebuildReport};
use tracing::{info, instrument};

use crate::errors::RebuildError;
use crate::source::AddressSource;

/// Records read from the source per page.
pub const DEFAULT_PAGE_SIZE: u64 = 2000;

/// The monthly extract a rebuild is run for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractPeriod {
    pub year: u16,
    pub month: u8,
}

impl ExtractPeriod {
    /// Validate a `(year, month)` pair. The month must be given as exactly two
    /// digits, e.g. `"03"`.
    ///
    /// ```
    /// use geocoder::job::ExtractPeriod;
    ///
    /// assert!(ExtractPeriod::parse(2025, "03").is_ok());
    /// assert!(ExtractPeriod::parse(2025, "3").is_err());
    /// assert!(ExtractPeriod::parse(0, "03").is_err());
    /// ```
    pub fn parse(year: i32, month: &str) -> Result<Self, RebuildError> {
        let invalid = || {
            RebuildError::validation(format!(
                "Invalid extract period year={}, month={:?}: year must be 1-9999 and month two digits 01-12",
                year, month
            ))
        };

        if !(1..=9999).contains(&year) {
            return Err(invalid());
        }
        if month.len() != 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month: u8 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self {
            year: year as u16,
            month,
        })
    }
}

impl fmt::Display for ExtractPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Result of a successful rebuild job.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildOutcome {
    /// The extract period the run was started for.
    pub period: ExtractPeriod,
    pub report: RebuildReport,
    pub production: ProductionSummary,
}

pub struct RebuildJob {
    source: Arc<dyn AddressSource>,
    lifecycle: IndexLifecycleManager,
    builder: DocumentBuilder,
    page_size: u64,
}

impl RebuildJob {
    pub fn new(
        source: Arc<dyn AddressSource>,
        lifecycle: IndexLifecycleManager,
        builder: DocumentBuilder,
    ) -> Self {
        Self {
            source,
            lifecycle,
            builder,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn run(&self, period: ExtractPeriod) -> Result<RebuildOutcome, RebuildError> {
        self.run_at(Utc::now(), period).await
    }

    /// Run the rebuild with the generation named after `created_at`.
    ///
    /// `period` labels the run and is returned in the outcome. Loading the
    /// monthly extract into the address database happens upstream; the job
    /// always indexes what the source currently holds.
    #[instrument(skip(self))]
    pub async fn run_at(
        &self,
        created_at: DateTime<Utc>,
        period: ExtractPeriod,
    ) -> Result<RebuildOutcome, RebuildError> {
        info!(page_size = self.page_size, "Starting address index rebuild");

        let stats = Arc::new(ProductionStats::default());
        let pages = document_pages(
            self.source.clone(),
            self.builder,
            self.page_size,
            stats.clone(),
        );

        let report = self.lifecycle.rebuild_at(created_at, pages).await?;
        let production = stats.summary();

        info!(
            generation = %report.generation.name,
            records = production.records,
            documents = production.documents,
            skipped = production.skipped,
            dropped = production.dropped,
            "Address index rebuild finished"
        );

        Ok(RebuildOutcome {
            period,
            report,
            production,
        })
    }
}
