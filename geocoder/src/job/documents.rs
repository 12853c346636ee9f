//! Turns address records into index documents, one source page at a time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{stream, Stream};
use geocoder_repository::GeoIndexError;
use geocoder_shared::{CoordinateSystem, CoordinateTransformer, GeoDocument, TransformError};
use tracing::{debug, info, warn};

use crate::source::{AddressSource, AddressWithEntrance};

/// What became of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Document(GeoDocument),
    /// The record has no entrance, or its entrance has no point.
    NoEntrance,
    /// The entrance point could not be turned into a WGS84 location.
    Dropped(TransformError),
}

/// Converts records to documents, resolving entrance points to WGS84.
#[derive(Debug, Clone, Copy)]
pub struct DocumentBuilder {
    transformer: CoordinateTransformer,
    entrance_system: CoordinateSystem,
}

impl DocumentBuilder {
    /// `entrance_system` is the system the entrance X/Y columns are stored in.
    pub fn new(transformer: CoordinateTransformer, entrance_system: CoordinateSystem) -> Self {
        Self {
            transformer,
            entrance_system,
        }
    }

    pub fn build(&self, record: &AddressWithEntrance) -> RecordOutcome {
        let Some(coordinate) = record
            .entrance
            .and_then(|entrance| entrance.coordinate(self.entrance_system))
        else {
            return RecordOutcome::NoEntrance;
        };

        let location = match self.transformer.to_geodetic(coordinate) {
            Ok(location) if location.is_valid() => location,
            Ok(location) => {
                return RecordOutcome::Dropped(TransformError::InvalidInput(format!(
                    "lat={}, lon={}",
                    location.lat, location.lon
                )))
            }
            Err(e) => return RecordOutcome::Dropped(e),
        };

        RecordOutcome::Document(
            GeoDocument::new(record.address.full_address(), location)
                .with_id(record.address.document_id()),
        )
    }
}

/// Running totals of document production.
#[derive(Debug, Default)]
pub struct ProductionStats {
    records: AtomicUsize,
    documents: AtomicUsize,
    skipped: AtomicUsize,
    dropped: AtomicUsize,
    pages: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductionSummary {
    pub records: usize,
    pub documents: usize,
    /// Records without an entrance point.
    pub skipped: usize,
    /// Records whose entrance point failed to transform.
    pub dropped: usize,
    pub pages: usize,
}

impl ProductionStats {
    pub fn summary(&self) -> ProductionSummary {
        ProductionSummary {
            records: self.records.load(Ordering::Relaxed),
            documents: self.documents.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
        }
    }
}

/// Build the documents of one page, updating `stats`.
pub fn build_page(
    builder: &DocumentBuilder,
    records: &[AddressWithEntrance],
    stats: &ProductionStats,
) -> Vec<GeoDocument> {
    let mut documents = Vec::with_capacity(records.len());

    for record in records {
        match builder.build(record) {
            RecordOutcome::Document(doc) => documents.push(doc),
            RecordOutcome::NoEntrance => {
                stats.skipped.fetch_add(1, Ordering::Relaxed);
            }
            RecordOutcome::Dropped(reason) => {
                warn!(
                    document_id = %record.address.document_id(),
                    error = %reason,
                    "Dropping record with untransformable entrance"
                );
                stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    stats.records.fetch_add(records.len(), Ordering::Relaxed);
    stats.documents.fetch_add(documents.len(), Ordering::Relaxed);
    stats.pages.fetch_add(1, Ordering::Relaxed);
    documents
}

/// Walk `source` page by page and yield each page's documents.
///
/// The stream ends at the first empty source page. A page whose records all
/// lack an entrance yields an empty document list and does not end the
/// stream.
pub fn document_pages(
    source: Arc<dyn AddressSource>,
    builder: DocumentBuilder,
    page_size: u64,
    stats: Arc<ProductionStats>,
) -> impl Stream<Item = Result<Vec<GeoDocument>, GeoIndexError>> + Send {
    stream::try_unfold(0u64, move |offset| {
        let source = source.clone();
        let stats = stats.clone();
        async move {
            let records = source
                .page(offset, page_size)
                .await
                .map_err(|e| GeoIndexError::document_source(e.to_string()))?;

            if records.is_empty() {
                debug!(offset = offset, "Address source exhausted");
                return Ok(None);
            }

            let documents = build_page(&builder, &records, &stats);
            let summary = stats.summary();
            info!(
                page = summary.pages,
                records = records.len(),
                documents = documents.len(),
                processed_total = summary.records,
                "Produced documents for page"
            );

            Ok(Some((documents, offset + records.len() as u64)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RebuildError;
    use crate::source::{Entrance, RoadNameAddress};
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use std::sync::Mutex;

    fn record(main: i32, entrance: Option<Entrance>) -> AddressWithEntrance {
        AddressWithEntrance {
            address: RoadNameAddress {
                address_management_no: format!("AMN{}", main),
                road_name_code: "111103100014".to_string(),
                is_basement: "0".to_string(),
                building_main_no: main,
                building_sub_no: 0,
                sido_name: Some("서울특별시".to_string()),
                sigungu_name: Some("중구".to_string()),
                legal_emd_name: None,
                road_name: Some("세종대로".to_string()),
            },
            entrance,
        }
    }

    fn planar(x: f64, y: f64) -> Option<Entrance> {
        Some(Entrance {
            x: Some(x),
            y: Some(y),
        })
    }

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(CoordinateTransformer::default(), CoordinateSystem::Planar)
    }

    struct MockSource {
        records: Vec<AddressWithEntrance>,
        requests: Mutex<Vec<(u64, u64)>>,
        fail_at: Option<u64>,
    }

    impl MockSource {
        fn new(records: Vec<AddressWithEntrance>) -> Self {
            Self {
                records,
                requests: Mutex::new(Vec::new()),
                fail_at: None,
            }
        }
    }

    #[async_trait]
    impl AddressSource for MockSource {
        async fn page(
            &self,
            offset: u64,
            limit: u64,
        ) -> Result<Vec<AddressWithEntrance>, RebuildError> {
            self.requests.lock().unwrap().push((offset, limit));
            if self.fail_at == Some(offset) {
                return Err(RebuildError::source_failed("connection closed"));
            }
            Ok(self
                .records
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_planar_entrance_becomes_document() {
        let outcome = builder().build(&record(110, planar(953_892.21, 1_952_009.94)));

        let RecordOutcome::Document(doc) = outcome else {
            panic!("expected a document, got {:?}", outcome);
        };
        assert_eq!(doc.full_address, "서울특별시 중구 세종대로 110");
        assert_eq!(doc.document_id.as_deref(), Some("AMN110_111103100014_0_110_0"));
        assert!((doc.location.lat - 37.566).abs() < 0.01);
        assert!((doc.location.lon - 126.978).abs() < 0.01);
    }

    #[test]
    fn test_geodetic_entrance_passes_through() {
        let builder =
            DocumentBuilder::new(CoordinateTransformer::default(), CoordinateSystem::Geodetic);
        let outcome = builder.build(&record(1, planar(126.9779, 37.5663)));

        let RecordOutcome::Document(doc) = outcome else {
            panic!("expected a document, got {:?}", outcome);
        };
        assert_eq!(doc.location.lat, 37.5663);
        assert_eq!(doc.location.lon, 126.9779);
    }

    #[test]
    fn test_missing_entrance_is_skipped() {
        assert_eq!(builder().build(&record(1, None)), RecordOutcome::NoEntrance);
        let half = Some(Entrance {
            x: Some(953_892.21),
            y: None,
        });
        assert_eq!(builder().build(&record(1, half)), RecordOutcome::NoEntrance);
    }

    #[test]
    fn test_out_of_bounds_entrance_is_dropped() {
        let outcome = builder().build(&record(1, planar(0.0, 0.0)));
        assert!(matches!(
            outcome,
            RecordOutcome::Dropped(TransformError::PlanarOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_build_page_counts() {
        let stats = ProductionStats::default();
        let records = vec![
            record(1, planar(953_892.21, 1_952_009.94)),
            record(2, None),
            record(3, planar(1.0, 1.0)),
            record(4, planar(1_000_000.0, 2_000_000.0)),
        ];

        let docs = build_page(&builder(), &records, &stats);

        assert_eq!(docs.len(), 2);
        assert_eq!(
            stats.summary(),
            ProductionSummary {
                records: 4,
                documents: 2,
                skipped: 1,
                dropped: 1,
                pages: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_pages_until_empty_page() {
        let records: Vec<_> = (1..=5)
            .map(|i| record(i, planar(953_892.21, 1_952_009.94 + i as f64)))
            .collect();
        let source = Arc::new(MockSource::new(records));
        let stats = Arc::new(ProductionStats::default());

        let pages: Vec<Vec<GeoDocument>> =
            document_pages(source.clone(), builder(), 2, stats.clone())
                .try_collect()
                .await
                .unwrap();

        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(
            *source.requests.lock().unwrap(),
            vec![(0, 2), (2, 2), (4, 2), (5, 2)]
        );
        assert_eq!(stats.summary().documents, 5);
    }

    #[tokio::test]
    async fn test_page_without_entrances_does_not_end_stream() {
        let records = vec![
            record(1, None),
            record(2, None),
            record(3, planar(953_892.21, 1_952_009.94)),
        ];
        let source = Arc::new(MockSource::new(records));
        let stats = Arc::new(ProductionStats::default());

        let pages: Vec<Vec<GeoDocument>> = document_pages(source, builder(), 2, stats.clone())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_empty());
        assert_eq!(pages[1].len(), 1);
        assert_eq!(stats.summary().skipped, 2);
    }

    #[tokio::test]
    async fn test_source_failure_ends_stream_with_error() {
        let mut source = MockSource::new(vec![record(1, None), record(2, None)]);
        source.fail_at = Some(1);

        let result: Result<Vec<Vec<GeoDocument>>, GeoIndexError> = document_pages(
            Arc::new(source),
            builder(),
            1,
            Arc::new(ProductionStats::default()),
        )
        .try_collect()
        .await;

        assert!(matches!(result, Err(GeoIndexError::DocumentSourceError(_))));
    }
}
