//! CSV Loader
//!
//! Builds a `MeasurementStore` from a CSV table with one timestamp column and
//! one numeric column per road (`Road_1`, `Road_2`, ...). Columns that are
//! neither are ignored.

use chrono::{NaiveDate, NaiveDateTime};
use std::io::Read;
use std::path::Path;

use super::error::{StorageError, StorageResult};
use super::store::MeasurementStore;
use super::types::{EntityId, Row};

/// Timestamp formats accepted in the timestamp column
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Loads measurement tables from CSV
pub struct CsvLoader {
    /// Name of the timestamp column (matched case-insensitively)
    timestamp_column: String,
}

/// Summary of a load
#[derive(Debug, Default)]
pub struct LoadReport {
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub cells_absent: usize,
    pub errors: Vec<String>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    /// Create a loader expecting a `Timestamp` column
    pub fn new() -> Self {
        Self {
            timestamp_column: "Timestamp".to_string(),
        }
    }

    /// Set the timestamp column name
    pub fn with_timestamp_column(mut self, column: &str) -> Self {
        self.timestamp_column = column.to_string();
        self
    }

    /// Load a store from a CSV file
    pub fn load(&self, path: &Path) -> StorageResult<(MeasurementStore, LoadReport)> {
        let file = std::fs::File::open(path)?;
        let (store, report) = self.load_reader(file)?;

        tracing::info!(
            path = %path.display(),
            rows = report.rows_loaded,
            skipped = report.rows_skipped,
            roads = store.entity_ids().len(),
            "Loaded measurement table"
        );

        Ok((store, report))
    }

    /// Load a store from CSV text (useful for testing)
    pub fn load_str(&self, csv_data: &str) -> StorageResult<(MeasurementStore, LoadReport)> {
        self.load_reader(csv_data.as_bytes())
    }

    fn load_reader<R: Read>(&self, source: R) -> StorageResult<(MeasurementStore, LoadReport)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let timestamp_idx = self.find_timestamp_column(&headers)?;

        let entity_columns: Vec<(usize, EntityId)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != timestamp_idx)
            .filter_map(|(idx, header)| EntityId::parse(header).map(|id| (idx, id)))
            .collect();

        if entity_columns.is_empty() {
            return Err(StorageError::NoEntityColumns);
        }

        let mut report = LoadReport::default();
        let mut rows = Vec::new();

        for (line_num, result) in reader.records().enumerate() {
            // header is line 1
            let line = line_num + 2;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    report.errors.push(format!("Line {}: {}", line, e));
                    report.rows_skipped += 1;
                    continue;
                }
            };

            let raw_ts = record.get(timestamp_idx).unwrap_or("");
            let timestamp = match parse_cell_timestamp(raw_ts) {
                Some(ts) => ts,
                None => {
                    report
                        .errors
                        .push(format!("Line {}: could not parse timestamp '{}'", line, raw_ts));
                    report.rows_skipped += 1;
                    continue;
                }
            };

            let cells: Vec<Option<f64>> = entity_columns
                .iter()
                .map(|(idx, _)| {
                    record
                        .get(*idx)
                        .filter(|s| !s.is_empty())
                        .and_then(|s| s.parse::<f64>().ok())
                        .filter(|v| v.is_finite())
                })
                .collect();
            report.cells_absent += cells.iter().filter(|c| c.is_none()).count();

            rows.push(Row::new(timestamp, cells));
        }

        for error in &report.errors {
            tracing::warn!("Skipped CSV row: {}", error);
        }

        rows.sort_by_key(|row| row.timestamp);
        report.rows_loaded = rows.len();

        let entities = entity_columns.into_iter().map(|(_, id)| id).collect();
        let store = MeasurementStore::new(entities, rows)?;

        Ok((store, report))
    }

    /// Find the timestamp column: configured name first, then any header
    /// mentioning a time or date
    fn find_timestamp_column(&self, headers: &csv::StringRecord) -> StorageResult<usize> {
        let wanted = self.timestamp_column.to_lowercase();

        if let Some(idx) = headers.iter().position(|h| h.to_lowercase() == wanted) {
            return Ok(idx);
        }

        headers
            .iter()
            .position(|h| {
                let h = h.to_lowercase();
                h.contains("time") || h.contains("date")
            })
            .ok_or_else(|| StorageError::MissingTimestampColumn(self.timestamp_column.clone()))
    }
}

fn parse_cell_timestamp(raw: &str) -> Option<NaiveDateTime> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
