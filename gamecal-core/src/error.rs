//! Error types for gamecal.

use thiserror::Error;

/// Errors that can occur while parsing a schedule or syncing it to a calendar.
#[derive(Error, Debug)]
pub enum GameCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing {field} in schedule entry (opponent: {})", .opponent.as_deref().unwrap_or("unknown opponent"))]
    ParseFieldMissing {
        field: &'static str,
        opponent: Option<String>,
    },

    #[error("Could not parse date '{date}' with time '{time}': {reason}")]
    Format {
        date: String,
        time: String,
        reason: String,
    },

    #[error("Duplicate check failed: {0}")]
    DuplicateCheck(String),

    #[error("Failed to create event: {0}")]
    EventCreation(String),

    #[error("Could not open calendar session: {0}")]
    Session(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GameCalError {
    pub(crate) fn format(date: &str, time: &str, reason: impl Into<String>) -> Self {
        GameCalError::Format {
            date: date.to_string(),
            time: time.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for gamecal operations.
pub type GameCalResult<T> = Result<T, GameCalError>;
