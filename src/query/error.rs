//! Query error types
//!
//! Every condition a single question can fail with. None of them end a
//! session: the engine turns each into an `Error: ...` sentence and the
//! caller may ask again.

use thiserror::Error;

use crate::storage::EntityId;

/// Errors that can occur while interpreting or executing a question
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// No road identifier in the question
    #[error("No road number found in query.")]
    EntityMissing,

    /// Road identifier is not a column of the table
    #[error("Invalid road ID {}. Available roads are: {}.", .entity, join_ids(.available))]
    UnknownEntity {
        entity: EntityId,
        available: Vec<EntityId>,
    },

    /// Timestamp literal is not a real calendar date/time
    #[error("Invalid timestamp '{0}'. Please use YYYY-MM-DD HH:MM:SS.")]
    InvalidTimestamp(String),

    /// Exact timestamp lookup found nothing for the road
    #[error("No data available for {entity} at {timestamp}.")]
    NoDataAtTimestamp { entity: EntityId, timestamp: String },

    /// Range filter matched no rows
    #[error("No data available for {entity} between {start} and {end}.")]
    EmptyRange {
        entity: EntityId,
        start: String,
        end: String,
    },

    /// The road has no recorded readings where one is required
    #[error("No readings recorded for {entity}.")]
    NoReadings { entity: EntityId },

    /// The intent carries no actionable action
    #[error("I couldn't understand your query. Please try rephrasing it.")]
    UnrecognizedIntent,

    /// The structured intent violates the wire shape
    #[error("Malformed query intent: {0}.")]
    MalformedIntent(String),
}

impl QueryError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::EntityMissing => "entity_missing",
            Self::UnknownEntity { .. } => "unknown_entity",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::NoDataAtTimestamp { .. } => "no_data_at_timestamp",
            Self::EmptyRange { .. } => "empty_range",
            Self::NoReadings { .. } => "no_readings",
            Self::UnrecognizedIntent => "unrecognized_intent",
            Self::MalformedIntent(_) => "malformed_intent",
        }
    }
}

fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(EntityId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
