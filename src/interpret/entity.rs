//! Entity Extractor
//!
//! Finds the road a question is about: `road 101`, `Road101`, `ROAD_101`
//! and `Road_101` all give `Road_101`. Existence in the table is not checked
//! here.

use regex::Regex;
use std::sync::LazyLock;

use crate::storage::EntityId;

static ROAD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)road_?\s*(\d+)").expect("Invalid regex"));

/// First road mentioned in `text`, if any
pub fn extract_entity(text: &str) -> Option<EntityId> {
    ROAD_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| EntityId::from_digits(digits.as_str()))
}
