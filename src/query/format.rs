//! Response Formatter
//!
//! Renders an execution outcome as display text. Output depends only on the
//! outcome, so the same result always produces the same text.
//!
//! # Examples
//!
//! ```text
//! The highest water level on Road_101 was 3.00 meters on 2024-10-01 01:00:00.
//! Error: No road number found in query.
//! ```

use std::fmt::Write;

use crate::query::error::QueryResult;
use crate::query::executor::{Answer, Extreme, RangeSummary};
use crate::storage::{format_timestamp, EntityId};

/// Placeholder for a missing value
const NOT_AVAILABLE: &str = "N/A";

/// Render an execution outcome
pub fn render(outcome: &QueryResult<Answer>) -> String {
    match outcome {
        Ok(answer) => render_answer(answer),
        Err(err) => format!("Error: {}", err),
    }
}

/// Render a successful answer
pub fn render_answer(answer: &Answer) -> String {
    match answer {
        Answer::Extremum {
            entity,
            extreme,
            reading,
        } => {
            let label = match extreme {
                Extreme::Max => "highest",
                Extreme::Min => "minimum",
            };
            format!(
                "The {} water level on {} was {} meters on {}.",
                label,
                entity,
                level(reading.value),
                format_timestamp(&reading.timestamp)
            )
        }
        Answer::Average { entity, mean, span } => format!(
            "The average water level on {} was {} meters (calculated from {} to {}).",
            entity,
            level(*mean),
            format_timestamp(&span.start),
            format_timestamp(&span.end)
        ),
        Answer::Latest {
            entity, reading, ..
        } => format!(
            "The latest water level on {} at {} was {} meters.",
            entity,
            format_timestamp(&reading.timestamp),
            level(reading.value)
        ),
        Answer::Point { entity, reading } => format!(
            "Water level on {} at {} was {} meters.",
            entity,
            format_timestamp(&reading.timestamp),
            level(reading.value)
        ),
        Answer::Range {
            entity,
            span,
            rows,
            summary,
        } => {
            let mut out = render_table(entity, rows);
            out.push_str("\n\n");
            out.push_str(&render_summary(
                entity,
                &format_timestamp(&span.start),
                &format_timestamp(&span.end),
                summary,
            ));
            out
        }
        Answer::RangeMax {
            entity,
            span,
            reading,
        } => format!(
            "The maximum water level on {} between {} and {} was {} meters on {}.",
            entity,
            format_timestamp(&span.start),
            format_timestamp(&span.end),
            level(reading.value),
            format_timestamp(&reading.timestamp)
        ),
    }
}

/// Two decimals, the precision of every displayed level
fn level(value: f64) -> String {
    format!("{:.2}", value)
}

fn optional_level(value: Option<f64>) -> String {
    value.map(level).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn render_table(entity: &EntityId, rows: &[(chrono::NaiveDateTime, Option<f64>)]) -> String {
    // timestamps are always 19 characters wide
    let mut out = format!("{:<19}  {}", "Timestamp", entity);
    for (timestamp, value) in rows {
        let _ = write!(
            out,
            "\n{}  {}",
            format_timestamp(timestamp),
            optional_level(*value)
        );
    }
    out
}

fn render_summary(entity: &EntityId, start: &str, end: &str, summary: &RangeSummary) -> String {
    format!(
        "Summary for {} from {} to {}:\nMinimum: {} meters\nMaximum: {} meters\nAverage: {} meters\nTotal readings: {}",
        entity,
        start,
        end,
        optional_level(summary.min),
        optional_level(summary.max),
        optional_level(summary.mean),
        summary.count
    )
}
