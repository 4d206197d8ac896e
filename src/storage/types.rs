//! Core data types for the measurement store
//!
//! - `EntityId`: canonical `Road_<digits>` identifier
//! - `Row`: one timestamp with a cell per entity column
//! - `Reading`: a present (timestamp, value) pair
//! - `TimeSpan`: first and last timestamp of a table or slice

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Prefix shared by every entity column
pub const ENTITY_PREFIX: &str = "Road_";

/// Display format for timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical entity identifier (`Road_` followed by one or more digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Build an identifier from the digits of a road number
    ///
    /// Returns `None` if `digits` is empty or contains anything but ASCII digits.
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(format!("{}{}", ENTITY_PREFIX, digits)))
    }

    /// Parse an already-prefixed identifier such as `Road_101`
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix(ENTITY_PREFIX).and_then(Self::from_digits)
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single present measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Inclusive span between two timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSpan {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }
}

/// One row of the table: a timestamp and one cell per entity column
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub timestamp: NaiveDateTime,
    cells: Vec<Option<f64>>,
}

impl Row {
    /// Create a row; NaN cells are stored as absent
    pub fn new(timestamp: NaiveDateTime, cells: Vec<Option<f64>>) -> Self {
        let cells = cells
            .into_iter()
            .map(|cell| cell.filter(|v| !v.is_nan()))
            .collect();
        Self { timestamp, cells }
    }

    /// Value of the cell at `column`, `None` when absent
    pub fn value(&self, column: usize) -> Option<f64> {
        self.cells.get(column).copied().flatten()
    }

    /// Reading at `column` if the cell is present
    pub fn reading(&self, column: usize) -> Option<Reading> {
        self.value(column).map(|v| Reading::new(self.timestamp, v))
    }

    /// Number of cells in this row
    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

/// Parse a `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` literal
///
/// A date without a time means midnight. Any run of whitespace may
/// separate the date from the time.
pub fn parse_timestamp(literal: &str) -> Option<NaiveDateTime> {
    let normalized = literal.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Render a timestamp the way every response prints it
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
