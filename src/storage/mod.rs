//! Measurement Storage
//!
//! This module provides the read-only table every query runs against:
//!
//! - **types**: Core data structures (EntityId, Row, Reading, TimeSpan)
//! - **store**: The immutable `MeasurementStore`
//! - **csv_loader**: Builds a store from a CSV export
//! - **error**: Error types
//!
//! # Layout
//!
//! ```text
//! Timestamp            Road_1  Road_2  ...
//! 2024-10-01 00:00:00  1.23    4.56
//! 2024-10-01 01:00:00  N/A     4.10
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use waterlevels::storage::CsvLoader;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (store, report) = CsvLoader::new().load(Path::new("road_water_levels.csv"))?;
//!     println!("{} rows, {} roads", report.rows_loaded, store.entity_ids().len());
//!     Ok(())
//! }
//! ```

pub mod csv_loader;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use csv_loader::{CsvLoader, LoadReport};
pub use error::{StorageError, StorageResult};
pub use store::MeasurementStore;
pub use types::{
    format_timestamp, parse_timestamp, EntityId, Reading, Row, TimeSpan, ENTITY_PREFIX,
    TIMESTAMP_FORMAT,
};
