//! Geo document types for the search index.
//!
//! This module defines the document structure that is indexed in the search engine.

use serde::{Deserialize, Serialize};

use crate::types::coordinate::GeodeticCoordinate;

/// Document representation for the address index.
///
/// A document is written once into an index generation and never updated in
/// place; a rebuild replaces the whole generation.
///
/// # Fields
///
/// - `document_id`: Optional stable id derived from the canonical record. Used
///   as the bulk `_id` so a retried batch overwrites instead of duplicating.
///   Not part of the stored source.
/// - `full_address`: The composed street address (full-text field)
/// - `location`: Entrance position (geo-point field)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeoDocument {
    #[serde(skip)]
    pub document_id: Option<String>,
    pub full_address: String,
    pub location: GeodeticCoordinate,
}

impl GeoDocument {
    /// Create a new document without a stable id.
    ///
    /// # Example
    ///
    /// ```
    /// use geocoder_shared::{GeoDocument, GeodeticCoordinate};
    ///
    /// let doc = GeoDocument::new("Seoul City Hall", GeodeticCoordinate::new(37.5663, 126.9779));
    /// assert!(doc.document_id.is_none());
    /// ```
    pub fn new(full_address: impl Into<String>, location: GeodeticCoordinate) -> Self {
        Self {
            document_id: None,
            full_address: full_address.into(),
            location,
        }
    }

    /// Attach a stable document id.
    pub fn with_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }
}
