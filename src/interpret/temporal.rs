//! Timestamp/Range Extractor
//!
//! Collects `YYYY-MM-DD[ HH:MM:SS]` literals left to right and decides
//! whether the question names a point or a range. Literals stay unparsed so a
//! bad date only fails at execution time.

use regex::Regex;
use std::sync::LazyLock;

use crate::query::TimeTarget;

static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}(?:\s+\d{2}:\d{2}:\d{2})?").expect("Invalid regex")
});

/// Words that turn two timestamps into a range
const RANGE_CUES: [&str; 2] = ["between", "from"];

/// Check whether the text contains a range cue (case-insensitive)
pub fn has_range_cue(text: &str) -> bool {
    let lower = text.to_lowercase();
    RANGE_CUES.iter().any(|cue| lower.contains(cue))
}

/// Every timestamp literal in `text`, in order of appearance
pub fn timestamp_literals(text: &str) -> Vec<&str> {
    TIMESTAMP_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Time constraint named by `text`
///
/// Two or more literals form a range only with a range cue; otherwise the
/// first literal is taken as a point.
pub fn extract_time_target(text: &str) -> TimeTarget {
    let literals = timestamp_literals(text);

    match literals.as_slice() {
        [] => TimeTarget::Unconstrained,
        [start, end, ..] if has_range_cue(text) => TimeTarget::Range {
            start: start.to_string(),
            end: end.to_string(),
        },
        [first, ..] => TimeTarget::Point(first.to_string()),
    }
}
