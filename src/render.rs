//! Terminal rendering for gamecal-core types.
//!
//! Extension traits that add colored output using owo_colors.

use gamecal_core::GameRecord;
use gamecal_core::schedule::{SkipReason, SkippedEntry};
use gamecal_core::sync::{GameOutcome, SyncReport};
use owo_colors::OwoColorize;

const KICKOFF_FORMAT: &str = "%a %b %-d %Y, %-I:%M %p %Z";

pub trait Render {
    fn render(&self) -> String;
}

impl Render for GameRecord {
    fn render(&self) -> String {
        format!(
            "{} {}",
            self.opponent_name(),
            format!(
                "{} · {}",
                self.kickoff.format(KICKOFF_FORMAT),
                self.location
            )
            .dimmed()
        )
    }
}

impl Render for SkippedEntry {
    fn render(&self) -> String {
        let opponent = self.opponent.as_deref().unwrap_or("unknown opponent");

        match &self.reason {
            SkipReason::Completed { result } => {
                format!("{} {}", opponent.dimmed(), format!("(played: {})", result).dimmed())
            }
            SkipReason::Past { kickoff } => format!(
                "{} {}",
                opponent.dimmed(),
                format!("(already started {})", kickoff.format(KICKOFF_FORMAT)).dimmed()
            ),
            SkipReason::Invalid { error } => {
                format!("{} {}", opponent.yellow(), error.to_string().yellow())
            }
        }
    }
}

impl Render for GameOutcome {
    fn render(&self) -> String {
        match self {
            GameOutcome::Created { opponent, .. } => {
                format!("{} {}", "+".green(), opponent.green())
            }
            GameOutcome::SkippedDuplicate { summary, .. } => {
                format!("{} {}", "=".dimmed(), format!("{} (already in calendar)", summary).dimmed())
            }
            GameOutcome::SkippedBeforeResume { opponent } => {
                format!("{} {}", "-".dimmed(), format!("{} (before resume point)", opponent).dimmed())
            }
            GameOutcome::Planned { event, .. } => format!(
                "{} {} {}",
                "+".green(),
                event.summary.green(),
                format!(
                    "{} {} · {}",
                    event.start.date_time.format("%a %b %-d %Y, %-I:%M %p"),
                    event.start.time_zone,
                    event.location
                )
                .dimmed()
            ),
        }
    }
}

pub fn render_report(report: &SyncReport) -> String {
    if report.outcomes.is_empty() {
        return "   No games to sync".dimmed().to_string();
    }

    report
        .outcomes
        .iter()
        .map(|outcome| format!("   {}", outcome.render()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
