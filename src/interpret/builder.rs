//! Structured Query Builder
//!
//! Combines the entity, time target and action found in a question into an
//! `Intent`. A question without a road always fails with `EntityMissing`,
//! whatever its action.

use tracing::debug;

use crate::interpret::classifier::classify;
use crate::interpret::entity::extract_entity;
use crate::interpret::temporal::extract_time_target;
use crate::query::{Intent, QueryError, QueryResult};

/// Rule-based question to intent conversion
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build an intent from free text
    pub fn build(&self, text: &str) -> QueryResult<Intent> {
        let entity = extract_entity(text).ok_or(QueryError::EntityMissing)?;
        let action = classify(text);
        let target = extract_time_target(text);

        debug!(%entity, %action, ?target, "Built intent");

        Intent::new(action, entity, target)
    }
}
