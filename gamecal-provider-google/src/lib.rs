//! gamecal-provider-google - Google Calendar provider for gamecal
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/gamecal/providers/google/app_config.toml
//!   ~/.config/gamecal/providers/google/session/{account}.toml

pub mod app_config;
pub mod authenticate;
mod calendar;
mod google_event;
pub mod session;

pub use calendar::{GoogleCalendar, GoogleSessionProvider};
