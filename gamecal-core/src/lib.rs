//! Core logic for gamecal.
//!
//! Parses a team's schedule page into upcoming games and syncs them into a
//! calendar:
//! - `schedule` walks the page, using `completion` to drop finished games and
//!   `datetime` to resolve kickoff times
//! - `sync` turns games into events through the `calendar` traits, which
//!   providers implement

pub mod calendar;
pub mod completion;
pub mod config;
pub mod datetime;
pub mod error;
pub mod game;
pub mod schedule;
pub mod sync;

pub use calendar::{CalendarService, EventTime, ExistingEvent, NewEvent, SessionProvider, TimeWindow};
pub use error::{GameCalError, GameCalResult};
pub use game::GameRecord;
