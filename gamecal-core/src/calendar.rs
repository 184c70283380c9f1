//! The calendar backend as seen by the synchronizer.
//!
//! Providers implement these traits; the core never talks to a network
//! itself.

#![allow(async_fn_in_trait)]

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::GameCalResult;

/// A local wall-clock time tagged with its IANA zone id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTime {
    pub date_time: NaiveDateTime,
    pub time_zone: String,
}

/// An event to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEvent {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub use_default_reminders: bool,
}

/// The parts of a stored event the synchronizer cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingEvent {
    pub id: String,
    pub summary: String,
    pub start: Option<DateTime<Utc>>,
}

/// Half-open search window for event queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn around(instant: DateTime<Utc>, slack: chrono::Duration) -> Self {
        TimeWindow {
            from: instant - slack,
            to: instant + slack,
        }
    }
}

pub trait CalendarService {
    /// Events overlapping `window` whose text matches `query`, ordered by start.
    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        query: &str,
    ) -> GameCalResult<Vec<ExistingEvent>>;

    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> GameCalResult<ExistingEvent>;
}

/// Hands out an authenticated calendar handle, refreshing or re-authorizing
/// as needed.
pub trait SessionProvider {
    type Service: CalendarService;

    async fn connect(&self) -> GameCalResult<Self::Service>;
}
