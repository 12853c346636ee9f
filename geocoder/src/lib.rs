//! # Geocoder
//!
//! Rebuilds the reverse-geocoding address index from the road-name address
//! database without serving downtime.
//!
//! ## Architecture
//!
//! 1. **Source**: Pages through address records with their entrances
//! 2. **Job**: Turns records into geo documents, transforming planar entrance
//!    points to WGS84
//! 3. **Lifecycle** (in `geocoder-repository`): Loads a fresh index generation
//!    and swaps the alias onto it
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`source`]: Address records and the database source
//! - [`job`]: Document production and the rebuild job
//! - [`errors`]: Error types for the rebuild

pub mod config;
pub mod errors;
pub mod job;
pub mod source;

pub use config::{ConnectionMode, Dependencies, GeocoderConfig};
pub use errors::RebuildError;
pub use job::{ExtractPeriod, RebuildJob, RebuildOutcome};
