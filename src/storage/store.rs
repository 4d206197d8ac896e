//! Measurement Store
//!
//! Immutable, in-memory table of timestamps × entity columns. Rows are kept
//! sorted with strictly increasing timestamps, which turns exact lookups and
//! range filters into binary searches.
//!
//! The store is built once at startup and shared read-only (usually behind an
//! `Arc`). Nothing in the crate mutates it after construction.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use super::error::{StorageError, StorageResult};
use super::types::{format_timestamp, EntityId, Reading, Row, TimeSpan};

/// Read-only time-series table keyed by timestamp
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    /// Entity columns in table order
    entities: Vec<EntityId>,
    /// Column position by entity
    index: HashMap<EntityId, usize>,
    /// Rows sorted by timestamp
    rows: Vec<Row>,
}

impl MeasurementStore {
    /// Build a store, checking every invariant
    ///
    /// Rows must already be sorted with unique timestamps and carry exactly
    /// one cell per entity column.
    pub fn new(entities: Vec<EntityId>, rows: Vec<Row>) -> StorageResult<Self> {
        let mut index = HashMap::with_capacity(entities.len());
        for (position, entity) in entities.iter().enumerate() {
            if index.insert(entity.clone(), position).is_some() {
                return Err(StorageError::InvalidStore(format!(
                    "duplicate column {}",
                    entity
                )));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.width() != entities.len() {
                return Err(StorageError::InvalidStore(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.width(),
                    entities.len()
                )));
            }
        }

        for pair in rows.windows(2) {
            if pair[0].timestamp == pair[1].timestamp {
                return Err(StorageError::DuplicateTimestamp(format_timestamp(
                    &pair[1].timestamp,
                )));
            }
            if pair[0].timestamp > pair[1].timestamp {
                return Err(StorageError::InvalidStore(format!(
                    "rows out of order at {}",
                    format_timestamp(&pair[1].timestamp)
                )));
            }
        }

        Ok(Self {
            entities,
            index,
            rows,
        })
    }

    /// All entity ids, in column order
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    /// Column position of an entity
    pub fn column_index(&self, entity: &EntityId) -> Option<usize> {
        self.index.get(entity).copied()
    }

    /// All rows in timestamp order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row whose timestamp equals `timestamp` exactly
    pub fn row_at(&self, timestamp: NaiveDateTime) -> Option<&Row> {
        self.rows
            .binary_search_by(|row| row.timestamp.cmp(&timestamp))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Rows with `start <= timestamp <= end`
    ///
    /// Returns an empty slice when `start > end`.
    pub fn range(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[Row] {
        if start > end {
            return &[];
        }
        let lo = self.rows.partition_point(|row| row.timestamp < start);
        let hi = self.rows.partition_point(|row| row.timestamp <= end);
        &self.rows[lo..hi]
    }

    /// Present readings of one entity across the whole table, oldest first
    ///
    /// Empty for an entity that is not a column.
    pub fn readings<'a>(
        &'a self,
        entity: &EntityId,
    ) -> impl DoubleEndedIterator<Item = Reading> + 'a {
        let column = self.column_index(entity);
        self.rows
            .iter()
            .filter_map(move |row| column.and_then(|c| row.reading(c)))
    }

    /// First and last timestamp of the table
    pub fn span(&self) -> Option<TimeSpan> {
        match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => Some(TimeSpan::new(first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}
