//! Structured Intent
//!
//! The typed form of a question, plus its JSON wire shape.
//!
//! ```text
//! {"action": "max", "road_id": "Road_101"}
//! {"action": "point", "road_id": "Road_102", "timestamp": "2024-10-15 08:00:00"}
//! {"action": "range_values", "road_id": "Road_9",
//!  "start_timestamp": "2024-10-01", "end_timestamp": "2024-10-03"}
//! ```

use serde::{Deserialize, Serialize};

use crate::query::error::{QueryError, QueryResult};
use crate::storage::EntityId;

/// Operation requested by a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Highest reading and when it happened
    #[serde(alias = "retrieve_max_water_level")]
    Max,
    /// Lowest reading and when it happened
    #[serde(alias = "retrieve_min_water_level")]
    Min,
    /// Mean over the whole table
    #[serde(alias = "retrieve_average_water_level")]
    Average,
    /// Most recent present reading
    #[serde(alias = "retrieve_latest_water_level")]
    Latest,
    /// Reading at one exact timestamp
    #[serde(alias = "retrieve_water_level")]
    Point,
    /// Every reading inside a range, with a summary
    #[serde(alias = "retrieve_all_water_levels_in_range")]
    RangeValues,
    /// Highest reading inside a range
    #[serde(alias = "retrieve_max_water_level_in_range")]
    RangeMax,
    /// Anything not recognized
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Wire tag of this action
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Average => "average",
            Self::Latest => "latest",
            Self::Point => "point",
            Self::RangeValues => "range_values",
            Self::RangeMax => "range_max",
            Self::Unknown => "unknown",
        }
    }

    /// Check if this action needs a (start, end) range
    pub fn requires_range(&self) -> bool {
        matches!(self, Self::RangeValues | Self::RangeMax)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time constraint attached to an intent
///
/// Timestamps stay as the literals found in the question; the executor
/// parses them so that extraction never fails on a bad date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimeTarget {
    /// No timestamp in the question
    #[default]
    Unconstrained,
    /// A single point in time
    Point(String),
    /// An inclusive (start, end) pair
    Range { start: String, end: String },
}

/// A parsed, typed question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub action: Action,
    pub entity_id: EntityId,
    pub target: TimeTarget,
}

impl Intent {
    /// Build an intent, rejecting range actions that carry no range
    pub fn new(action: Action, entity_id: EntityId, target: TimeTarget) -> QueryResult<Self> {
        if action.requires_range() && !matches!(target, TimeTarget::Range { .. }) {
            return Err(QueryError::MalformedIntent(format!(
                "{} needs a start and an end timestamp",
                action
            )));
        }

        Ok(Self {
            action,
            entity_id,
            target,
        })
    }

    /// Wire form of this intent
    pub fn to_payload(&self) -> IntentPayload {
        let mut payload = IntentPayload {
            action: Some(self.action),
            road_id: Some(self.entity_id.to_string()),
            ..Default::default()
        };

        match &self.target {
            TimeTarget::Unconstrained => {}
            TimeTarget::Point(ts) => payload.timestamp = Some(ts.clone()),
            TimeTarget::Range { start, end } => {
                payload.start_timestamp = Some(start.clone());
                payload.end_timestamp = Some(end.clone());
            }
        }

        payload
    }
}

/// JSON wire shape of an intent
///
/// Produced by any intent source and consumed by the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<String>,
}

impl IntentPayload {
    /// Decode a payload from JSON text
    pub fn from_json(json: &str) -> QueryResult<Self> {
        serde_json::from_str(json).map_err(|e| QueryError::MalformedIntent(e.to_string()))
    }
}

impl TryFrom<IntentPayload> for Intent {
    type Error = QueryError;

    fn try_from(payload: IntentPayload) -> QueryResult<Self> {
        let road_id = payload
            .road_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(QueryError::EntityMissing)?;

        let entity_id = EntityId::parse(&road_id).ok_or_else(|| {
            QueryError::MalformedIntent(format!("road_id '{}' is not of the form Road_<n>", road_id))
        })?;

        let action = payload
            .action
            .ok_or_else(|| QueryError::MalformedIntent("missing field `action`".to_string()))?;

        let target = match (payload.timestamp, payload.start_timestamp, payload.end_timestamp) {
            (None, None, None) => TimeTarget::Unconstrained,
            (Some(ts), None, None) => TimeTarget::Point(ts),
            (None, Some(start), Some(end)) => TimeTarget::Range { start, end },
            (Some(_), _, _) => {
                return Err(QueryError::MalformedIntent(
                    "timestamp cannot be combined with start_timestamp/end_timestamp".to_string(),
                ))
            }
            (None, _, _) => {
                return Err(QueryError::MalformedIntent(
                    "start_timestamp and end_timestamp must be given together".to_string(),
                ))
            }
        };

        Intent::new(action, entity_id, target)
    }
}
