//! Query Executor
//!
//! Runs a structured `Intent` against the `MeasurementStore`:
//! 1. Validate the road against the table's columns
//! 2. Parse timestamp literals (only here, never during extraction)
//! 3. Dispatch on the action
//!
//! # Policies
//!
//! - Absent cells never take part in extremes or means.
//! - Extremes keep the first occurrence, so ties resolve to the earliest timestamp.
//! - Ranges are inclusive at both bounds.
//! - A point query without a timestamp falls back to the latest reading.

use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::query::ast::{Action, Intent, IntentPayload, TimeTarget};
use crate::query::error::{QueryError, QueryResult};
use crate::storage::{parse_timestamp, EntityId, MeasurementStore, Reading, Row, TimeSpan};

/// Which extreme an `Answer::Extremum` holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

/// Summary statistics over a range slice
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    /// Rows in the slice, including rows where the road has no reading
    pub count: usize,
}

/// Successful result of executing an intent
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Highest or lowest reading of the whole column
    Extremum {
        entity: EntityId,
        extreme: Extreme,
        reading: Reading,
    },
    /// Mean of the whole column and the table's span
    Average {
        entity: EntityId,
        mean: f64,
        span: TimeSpan,
    },
    /// Last present reading; `fallback` marks a point query that had no timestamp
    Latest {
        entity: EntityId,
        reading: Reading,
        fallback: bool,
    },
    /// Reading at an exact timestamp
    Point { entity: EntityId, reading: Reading },
    /// Every row of an inclusive range, with summary statistics
    Range {
        entity: EntityId,
        span: TimeSpan,
        rows: Vec<(NaiveDateTime, Option<f64>)>,
        summary: RangeSummary,
    },
    /// Highest reading inside an inclusive range
    RangeMax {
        entity: EntityId,
        span: TimeSpan,
        reading: Reading,
    },
}

/// Query executor
pub struct QueryExecutor {
    /// Shared read-only table
    store: Arc<MeasurementStore>,
}

impl QueryExecutor {
    /// Create a new query executor
    pub fn new(store: Arc<MeasurementStore>) -> Self {
        Self { store }
    }

    /// The table this executor reads
    pub fn store(&self) -> &Arc<MeasurementStore> {
        &self.store
    }

    /// Execute a wire payload (converts, then executes)
    pub fn execute_payload(&self, payload: IntentPayload) -> QueryResult<Answer> {
        let intent = Intent::try_from(payload)?;
        self.execute(&intent)
    }

    /// Execute a structured intent
    pub fn execute(&self, intent: &Intent) -> QueryResult<Answer> {
        let entity = &intent.entity_id;
        let column = self
            .store
            .column_index(entity)
            .ok_or_else(|| QueryError::UnknownEntity {
                entity: entity.clone(),
                available: self.store.entity_ids().to_vec(),
            })?;

        tracing::debug!(action = %intent.action, road = %entity, "Executing intent");

        match intent.action {
            Action::Max => self.extremum(entity, Extreme::Max),
            Action::Min => self.extremum(entity, Extreme::Min),
            Action::Average => self.average(entity),
            Action::Latest => self.latest(entity, false),
            Action::Point => match &intent.target {
                TimeTarget::Point(literal) => self.point(entity, column, literal),
                // No timestamp: answer with the latest reading instead
                _ => self.latest(entity, true),
            },
            Action::RangeValues => {
                let (span, slice) = self.range_slice(entity, &intent.target)?;
                Ok(range_values(entity, span, slice, column))
            }
            Action::RangeMax => {
                let (span, slice) = self.range_slice(entity, &intent.target)?;
                let reading = extreme_reading(column_readings(slice, column), Extreme::Max)
                    .ok_or_else(|| QueryError::NoReadings {
                        entity: entity.clone(),
                    })?;
                Ok(Answer::RangeMax {
                    entity: entity.clone(),
                    span,
                    reading,
                })
            }
            Action::Unknown => Err(QueryError::UnrecognizedIntent),
        }
    }

    fn extremum(&self, entity: &EntityId, extreme: Extreme) -> QueryResult<Answer> {
        let reading = extreme_reading(self.store.readings(entity), extreme).ok_or_else(|| {
            QueryError::NoReadings {
                entity: entity.clone(),
            }
        })?;

        Ok(Answer::Extremum {
            entity: entity.clone(),
            extreme,
            reading,
        })
    }

    fn average(&self, entity: &EntityId) -> QueryResult<Answer> {
        let no_readings = || QueryError::NoReadings {
            entity: entity.clone(),
        };

        let mean = mean(self.store.readings(entity)).ok_or_else(no_readings)?;
        let span = self.store.span().ok_or_else(no_readings)?;

        Ok(Answer::Average {
            entity: entity.clone(),
            mean,
            span,
        })
    }

    fn latest(&self, entity: &EntityId, fallback: bool) -> QueryResult<Answer> {
        let reading = self
            .store
            .readings(entity)
            .next_back()
            .ok_or_else(|| QueryError::NoReadings {
                entity: entity.clone(),
            })?;

        if fallback {
            tracing::debug!(road = %entity, "Point query without timestamp, using latest reading");
        }

        Ok(Answer::Latest {
            entity: entity.clone(),
            reading,
            fallback,
        })
    }

    fn point(&self, entity: &EntityId, column: usize, literal: &str) -> QueryResult<Answer> {
        let timestamp = parse_literal(literal)?;

        let reading = self
            .store
            .row_at(timestamp)
            .and_then(|row| row.reading(column))
            .ok_or_else(|| QueryError::NoDataAtTimestamp {
                entity: entity.clone(),
                timestamp: crate::storage::format_timestamp(&timestamp),
            })?;

        Ok(Answer::Point {
            entity: entity.clone(),
            reading,
        })
    }

    /// Parse the range bounds and filter the table, failing on an empty slice
    fn range_slice(
        &self,
        entity: &EntityId,
        target: &TimeTarget,
    ) -> QueryResult<(TimeSpan, &[Row])> {
        let (start, end) = match target {
            TimeTarget::Range { start, end } => (parse_literal(start)?, parse_literal(end)?),
            _ => {
                return Err(QueryError::MalformedIntent(
                    "range query without start and end timestamps".to_string(),
                ))
            }
        };

        let slice = self.store.range(start, end);
        if slice.is_empty() {
            return Err(QueryError::EmptyRange {
                entity: entity.clone(),
                start: crate::storage::format_timestamp(&start),
                end: crate::storage::format_timestamp(&end),
            });
        }

        Ok((TimeSpan::new(start, end), slice))
    }
}

fn parse_literal(literal: &str) -> QueryResult<NaiveDateTime> {
    parse_timestamp(literal).ok_or_else(|| QueryError::InvalidTimestamp(literal.to_string()))
}

/// Present readings of `column` within a slice of rows
fn column_readings(rows: &[Row], column: usize) -> impl Iterator<Item = Reading> + '_ {
    rows.iter().filter_map(move |row| row.reading(column))
}

/// First reading holding the extreme value
fn extreme_reading(readings: impl Iterator<Item = Reading>, extreme: Extreme) -> Option<Reading> {
    readings.fold(None, |best: Option<Reading>, reading| match best {
        None => Some(reading),
        Some(b) => {
            let better = match extreme {
                Extreme::Max => reading.value > b.value,
                Extreme::Min => reading.value < b.value,
            };
            Some(if better { reading } else { b })
        }
    })
}

fn mean(readings: impl Iterator<Item = Reading>) -> Option<f64> {
    let (sum, count) = readings.fold((0.0, 0usize), |(sum, count), reading| {
        (sum + reading.value, count + 1)
    });

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn range_values(entity: &EntityId, span: TimeSpan, slice: &[Row], column: usize) -> Answer {
    let summary = RangeSummary {
        min: extreme_reading(column_readings(slice, column), Extreme::Min).map(|r| r.value),
        max: extreme_reading(column_readings(slice, column), Extreme::Max).map(|r| r.value),
        mean: mean(column_readings(slice, column)),
        count: slice.len(),
    };

    Answer::Range {
        entity: entity.clone(),
        span,
        rows: slice
            .iter()
            .map(|row| (row.timestamp, row.value(column)))
            .collect(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Row;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn road(n: &str) -> EntityId {
        EntityId::from_digits(n).unwrap()
    }

    /// Road_101: 1.0, 3.0, 3.0, 2.0 hourly from 2024-10-01 00:00
    /// Road_5:   absent, 2.0, absent, 4.0
    fn create_test_executor() -> QueryExecutor {
        let store = MeasurementStore::new(
            vec![road("101"), road("5"), road("8")],
            vec![
                Row::new(ts("2024-10-01 00:00:00"), vec![Some(1.0), None, None]),
                Row::new(ts("2024-10-01 01:00:00"), vec![Some(3.0), Some(2.0), None]),
                Row::new(ts("2024-10-01 02:00:00"), vec![Some(3.0), None, None]),
                Row::new(ts("2024-10-01 03:00:00"), vec![Some(2.0), Some(4.0), None]),
            ],
        )
        .unwrap();
        QueryExecutor::new(Arc::new(store))
    }

    fn intent(action: Action, entity: &str, target: TimeTarget) -> Intent {
        Intent::new(action, road(entity), target).unwrap()
    }

    fn range(start: &str, end: &str) -> TimeTarget {
        TimeTarget::Range {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    #[test]
    fn test_max_tie_breaks_to_earliest() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(Action::Max, "101", TimeTarget::Unconstrained))
            .unwrap();

        assert_eq!(
            answer,
            Answer::Extremum {
                entity: road("101"),
                extreme: Extreme::Max,
                reading: Reading::new(ts("2024-10-01 01:00:00"), 3.0),
            }
        );
    }

    #[test]
    fn test_min_ignores_absent_cells() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(Action::Min, "5", TimeTarget::Unconstrained))
            .unwrap();

        match answer {
            Answer::Extremum { reading, extreme, .. } => {
                assert_eq!(extreme, Extreme::Min);
                assert_eq!(reading, Reading::new(ts("2024-10-01 01:00:00"), 2.0));
            }
            other => panic!("unexpected answer: {:?}", other),
        }
    }

    #[test]
    fn test_average_covers_whole_table() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(Action::Average, "5", TimeTarget::Unconstrained))
            .unwrap();

        assert_eq!(
            answer,
            Answer::Average {
                entity: road("5"),
                mean: 3.0,
                span: TimeSpan::new(ts("2024-10-01 00:00:00"), ts("2024-10-01 03:00:00")),
            }
        );
    }

    #[test]
    fn test_average_ignores_time_target() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(
                Action::Average,
                "101",
                TimeTarget::Point("2024-10-01 00:00:00".to_string()),
            ))
            .unwrap();

        match answer {
            Answer::Average { mean, .. } => assert!((mean - 2.25).abs() < 1e-9),
            other => panic!("unexpected answer: {:?}", other),
        }
    }

    #[test]
    fn test_latest_skips_trailing_absent() {
        let store = MeasurementStore::new(
            vec![road("1")],
            vec![
                Row::new(ts("2024-10-01 00:00:00"), vec![Some(1.5)]),
                Row::new(ts("2024-10-01 01:00:00"), vec![None]),
            ],
        )
        .unwrap();
        let executor = QueryExecutor::new(Arc::new(store));

        let answer = executor
            .execute(&intent(Action::Latest, "1", TimeTarget::Unconstrained))
            .unwrap();
        assert_eq!(
            answer,
            Answer::Latest {
                entity: road("1"),
                reading: Reading::new(ts("2024-10-01 00:00:00"), 1.5),
                fallback: false,
            }
        );
    }

    #[test]
    fn test_point_without_timestamp_falls_back_to_latest() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(Action::Point, "101", TimeTarget::Unconstrained))
            .unwrap();

        assert_eq!(
            answer,
            Answer::Latest {
                entity: road("101"),
                reading: Reading::new(ts("2024-10-01 03:00:00"), 2.0),
                fallback: true,
            }
        );
    }

    #[test]
    fn test_point_exact_match() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(
                Action::Point,
                "101",
                TimeTarget::Point("2024-10-01 02:00:00".to_string()),
            ))
            .unwrap();

        assert_eq!(
            answer,
            Answer::Point {
                entity: road("101"),
                reading: Reading::new(ts("2024-10-01 02:00:00"), 3.0),
            }
        );
    }

    #[test]
    fn test_point_no_nearest_neighbor() {
        let executor = create_test_executor();
        let err = executor
            .execute(&intent(
                Action::Point,
                "101",
                TimeTarget::Point("2024-10-01 02:30:00".to_string()),
            ))
            .unwrap_err();

        assert_eq!(
            err,
            QueryError::NoDataAtTimestamp {
                entity: road("101"),
                timestamp: "2024-10-01 02:30:00".to_string(),
            }
        );
    }

    #[test]
    fn test_point_absent_cell_is_no_data() {
        let executor = create_test_executor();
        let err = executor
            .execute(&intent(
                Action::Point,
                "5",
                TimeTarget::Point("2024-10-01 00:00:00".to_string()),
            ))
            .unwrap_err();

        assert_eq!(err.code(), "no_data_at_timestamp");
    }

    #[test]
    fn test_point_invalid_timestamp_names_literal() {
        let executor = create_test_executor();
        let err = executor
            .execute(&intent(
                Action::Point,
                "101",
                TimeTarget::Point("2024-13-40".to_string()),
            ))
            .unwrap_err();

        assert_eq!(err, QueryError::InvalidTimestamp("2024-13-40".to_string()));
    }

    #[test]
    fn test_range_values_inclusive_bounds() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(
                Action::RangeValues,
                "5",
                range("2024-10-01 01:00:00", "2024-10-01 03:00:00"),
            ))
            .unwrap();

        match answer {
            Answer::Range { rows, summary, .. } => {
                assert_eq!(
                    rows,
                    vec![
                        (ts("2024-10-01 01:00:00"), Some(2.0)),
                        (ts("2024-10-01 02:00:00"), None),
                        (ts("2024-10-01 03:00:00"), Some(4.0)),
                    ]
                );
                assert_eq!(
                    summary,
                    RangeSummary {
                        min: Some(2.0),
                        max: Some(4.0),
                        mean: Some(3.0),
                        count: 3,
                    }
                );
            }
            other => panic!("unexpected answer: {:?}", other),
        }
    }

    #[test]
    fn test_range_excludes_rows_just_outside() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(
                Action::RangeValues,
                "101",
                range("2024-10-01 00:00:01", "2024-10-01 02:59:59"),
            ))
            .unwrap();

        match answer {
            Answer::Range { rows, .. } => {
                let stamps: Vec<_> = rows.iter().map(|(t, _)| *t).collect();
                assert_eq!(
                    stamps,
                    vec![ts("2024-10-01 01:00:00"), ts("2024-10-01 02:00:00")]
                );
            }
            other => panic!("unexpected answer: {:?}", other),
        }
    }

    #[test]
    fn test_empty_range_is_an_error() {
        let executor = create_test_executor();
        let err = executor
            .execute(&intent(
                Action::RangeValues,
                "101",
                range("2024-11-01", "2024-11-03"),
            ))
            .unwrap_err();

        assert_eq!(
            err,
            QueryError::EmptyRange {
                entity: road("101"),
                start: "2024-11-01 00:00:00".to_string(),
                end: "2024-11-03 00:00:00".to_string(),
            }
        );
    }

    #[test]
    fn test_range_invalid_bound() {
        let executor = create_test_executor();
        let err = executor
            .execute(&intent(
                Action::RangeMax,
                "101",
                range("2024-10-01", "2024-02-31"),
            ))
            .unwrap_err();

        assert_eq!(err, QueryError::InvalidTimestamp("2024-02-31".to_string()));
    }

    #[test]
    fn test_range_max_restricted_to_slice() {
        let executor = create_test_executor();
        let answer = executor
            .execute(&intent(
                Action::RangeMax,
                "101",
                range("2024-10-01 02:00:00", "2024-10-01 03:00:00"),
            ))
            .unwrap();

        assert_eq!(
            answer,
            Answer::RangeMax {
                entity: road("101"),
                span: TimeSpan::new(ts("2024-10-01 02:00:00"), ts("2024-10-01 03:00:00")),
                reading: Reading::new(ts("2024-10-01 02:00:00"), 3.0),
            }
        );
    }

    #[test]
    fn test_unknown_entity_for_every_action() {
        let executor = create_test_executor();
        let actions = [
            (Action::Max, TimeTarget::Unconstrained),
            (Action::Min, TimeTarget::Unconstrained),
            (Action::Average, TimeTarget::Unconstrained),
            (Action::Latest, TimeTarget::Unconstrained),
            (Action::Point, TimeTarget::Point("2024-10-01".to_string())),
            (Action::RangeValues, range("2024-10-01", "2024-10-02")),
            (Action::RangeMax, range("2024-10-01", "2024-10-02")),
            (Action::Unknown, TimeTarget::Unconstrained),
        ];

        for (action, target) in actions {
            let err = executor.execute(&intent(action, "404", target)).unwrap_err();
            assert_eq!(
                err,
                QueryError::UnknownEntity {
                    entity: road("404"),
                    available: vec![road("101"), road("5"), road("8")],
                },
                "action: {}",
                action
            );
        }
    }

    #[test]
    fn test_unknown_action_is_unrecognized() {
        let executor = create_test_executor();
        let err = executor
            .execute(&intent(Action::Unknown, "101", TimeTarget::Unconstrained))
            .unwrap_err();
        assert_eq!(err, QueryError::UnrecognizedIntent);
    }

    #[test]
    fn test_column_without_readings() {
        let executor = create_test_executor();
        for action in [Action::Max, Action::Min, Action::Average, Action::Latest] {
            let err = executor
                .execute(&intent(action, "8", TimeTarget::Unconstrained))
                .unwrap_err();
            assert_eq!(err, QueryError::NoReadings { entity: road("8") });
        }
    }

    #[test]
    fn test_execute_payload() {
        let executor = create_test_executor();
        let payload =
            IntentPayload::from_json(r#"{"action": "retrieve_latest_water_level", "road_id": "Road_5"}"#)
                .unwrap();

        let answer = executor.execute_payload(payload).unwrap();
        assert!(matches!(answer, Answer::Latest { fallback: false, .. }));
    }
}
