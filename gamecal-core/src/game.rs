//! Upcoming games as extracted from a schedule page.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// One upcoming, not yet played game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub kickoff: DateTime<Tz>,
    pub opponent: String,
    pub location: String,
}

impl GameRecord {
    /// Opponent without surrounding whitespace, as used in titles and comparisons.
    pub fn opponent_name(&self) -> &str {
        self.opponent.trim()
    }
}
