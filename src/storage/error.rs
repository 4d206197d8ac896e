//! Storage error types
//!
//! Errors raised while building or loading the measurement store. All of
//! them are fatal at startup: a process without a store cannot answer
//! anything.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No timestamp column could be found in the header row
    #[error("Missing timestamp column: {0}")]
    MissingTimestampColumn(String),

    /// The table has no `Road_<n>` columns
    #[error("No entity columns found (expected headers like Road_1)")]
    NoEntityColumns,

    /// Two rows share the same timestamp
    #[error("Duplicate timestamp: {0}")]
    DuplicateTimestamp(String),

    /// Rows or columns violate the store invariants
    #[error("Invalid store: {0}")]
    InvalidStore(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
