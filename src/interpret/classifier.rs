//! Intent Classifier
//!
//! Maps keyword cues to an `Action`. Families are tested in a fixed order and
//! the first hit wins, so "average of the highest" is an average.
//!
//! | order | keywords                     | action                       |
//! |-------|------------------------------|------------------------------|
//! | 1     | average, avg, mean           | average                      |
//! | 2     | maximum, max, highest        | range_max with a cue, else max |
//! | 3     | minimum, min, lowest         | min                          |
//! | 4     | latest, recent, current      | latest                       |
//! | 5     | between, from                | range_values                 |
//! | 6     | (none)                       | point                        |

use crate::interpret::temporal::has_range_cue;
use crate::query::Action;

const AVERAGE_WORDS: [&str; 3] = ["average", "avg", "mean"];
const MAX_WORDS: [&str; 3] = ["maximum", "max", "highest"];
const MIN_WORDS: [&str; 3] = ["minimum", "min", "lowest"];
const LATEST_WORDS: [&str; 3] = ["latest", "recent", "current"];

/// Classify a question into an action; never fails
pub fn classify(text: &str) -> Action {
    let lower = text.to_lowercase();
    let range_cue = has_range_cue(&lower);

    if contains_any(&lower, &AVERAGE_WORDS) {
        Action::Average
    } else if contains_any(&lower, &MAX_WORDS) {
        if range_cue {
            Action::RangeMax
        } else {
            Action::Max
        }
    } else if contains_any(&lower, &MIN_WORDS) {
        Action::Min
    } else if contains_any(&lower, &LATEST_WORDS) {
        Action::Latest
    } else if range_cue {
        Action::RangeValues
    } else {
        Action::Point
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}
