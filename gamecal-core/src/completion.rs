//! Detects result fragments that belong to games which were already played.
//!
//! Schedule pages reuse the same slot for the tip-off time and the final
//! score, so "7:00 PM", "TBA", "W 82-74" and "W Blue 67, White 66" can all
//! show up in the same column.

use std::sync::LazyLock;

use regex::Regex;

/// "82-74", "67, 66"
static SCORE_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[,-]\s*\d+").expect("valid score pattern"));

/// "W 82", "L 74"
static WIN_LOSS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[WL]\s+\d+").expect("valid win/loss pattern"));

pub const DEFAULT_SCRIMMAGE_TEAMS: [&str; 2] = ["Blue", "White"];

static DEFAULT_CLASSIFIER: LazyLock<CompletionClassifier> =
    LazyLock::new(CompletionClassifier::default);

/// Returns true if `text` looks like a final score rather than a start time.
pub fn is_completed(text: &str) -> bool {
    DEFAULT_CLASSIFIER.is_completed(text)
}

/// Score detector with a configurable pair of intra-squad team names.
///
/// Intra-squad exhibitions name their sides by jersey color instead of an
/// opponent, so their scores read like "Blue 67".
#[derive(Debug, Clone)]
pub struct CompletionClassifier {
    team_scores: Vec<Regex>,
}

impl Default for CompletionClassifier {
    fn default() -> Self {
        Self::new(&DEFAULT_SCRIMMAGE_TEAMS)
    }
}

impl CompletionClassifier {
    pub fn new<S: AsRef<str>>(scrimmage_teams: &[S]) -> Self {
        let team_scores = scrimmage_teams
            .iter()
            .map(|team| {
                let pattern = format!(r"{} \d+", regex::escape(team.as_ref()));
                Regex::new(&pattern).expect("escaped team name is a valid pattern")
            })
            .collect();

        CompletionClassifier { team_scores }
    }

    pub fn is_completed(&self, text: &str) -> bool {
        SCORE_PAIR.is_match(text)
            || WIN_LOSS.is_match(text)
            || self.team_scores.iter().any(|re| re.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_are_completed() {
        for text in ["82-74", "67, 66", "W 82-74", "L 61-70", "W 82", "L 74", "Blue 67", "White 66"] {
            assert!(is_completed(text), "{text:?} should count as a final score");
        }
    }

    #[test]
    fn test_scrimmage_result_is_completed() {
        assert!(is_completed("W Blue 67, White 66"));
    }

    #[test]
    fn test_start_times_are_not_completed() {
        for text in ["7:00 PM", "12:00 PM", "9:30 am", "11:59 PM", "TBA", ""] {
            assert!(!is_completed(text), "{text:?} should not count as a final score");
        }
    }

    #[test]
    fn test_custom_scrimmage_teams() {
        let classifier = CompletionClassifier::new(&["Red", "Gold"]);

        assert!(classifier.is_completed("Red 55"));
        assert!(classifier.is_completed("Gold 12"));
        assert!(!classifier.is_completed("Blue"));
        // Score shapes don't depend on the team names
        assert!(classifier.is_completed("70-60"));
    }
}
