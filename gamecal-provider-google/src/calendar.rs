//! Google Calendar as a gamecal `CalendarService`.

use anyhow::Context;
use gamecal_core::calendar::{
    CalendarService, ExistingEvent, NewEvent, SessionProvider, TimeWindow,
};
use gamecal_core::error::{GameCalError, GameCalResult};
use google_calendar::Client;
use google_calendar::types::{OrderBy, SendUpdates};

use crate::authenticate;
use crate::google_event::{FromGoogle, ToGoogle};
use crate::session::Session;

fn provider_error(e: anyhow::Error) -> GameCalError {
    GameCalError::Provider(format!("{:#}", e))
}

pub struct GoogleCalendar {
    client: Client,
}

impl GoogleCalendar {
    pub fn new(client: Client) -> Self {
        GoogleCalendar { client }
    }
}

impl CalendarService for GoogleCalendar {
    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        query: &str,
    ) -> GameCalResult<Vec<ExistingEvent>> {
        let time_min = window.from.to_rfc3339();
        let time_max = window.to.to_rfc3339();

        let response = self
            .client
            .events()
            .list_all(
                calendar_id,
                "",
                0,
                OrderBy::StartTime,
                &[],
                query,
                &[],
                false,
                false,
                true, // single events, required for ordering by start time
                &time_max,
                &time_min,
                "",
                "",
            )
            .await
            .context("Failed to fetch events")
            .map_err(provider_error)?;

        Ok(response
            .body
            .into_iter()
            .map(ExistingEvent::from_google)
            .collect())
    }

    async fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> GameCalResult<ExistingEvent> {
        let google_event = event.to_google();

        let response = self
            .client
            .events()
            .insert(
                calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .with_context(|| format!("Failed to create event: {}", &google_event.summary))
            .map_err(|e| GameCalError::EventCreation(format!("{:#}", e)))?;

        Ok(ExistingEvent::from_google(response.body))
    }
}

/// Opens a `GoogleCalendar` for a stored account session.
///
/// Without an account, or when `interactive` is set and the account has no
/// stored session yet, the browser consent flow runs first.
pub struct GoogleSessionProvider {
    account: Option<String>,
    interactive: bool,
}

impl GoogleSessionProvider {
    pub fn new(account: Option<String>) -> Self {
        GoogleSessionProvider {
            account,
            interactive: true,
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Whether connecting will run the browser consent flow.
    pub fn needs_consent(&self) -> anyhow::Result<bool> {
        if !self.interactive {
            return Ok(false);
        }

        match &self.account {
            Some(account) => Ok(!Session::exists(account)?),
            None => Ok(true),
        }
    }

    async fn session(&self) -> anyhow::Result<Session> {
        if !self.needs_consent()? {
            if let Some(account) = &self.account {
                return Session::load_valid(account).await;
            }
        }

        if !self.interactive {
            anyhow::bail!(
                "No Google account configured.\n\
                Run `gamecal auth` and set google_account in the config."
            );
        }

        let account = authenticate::run().await?;
        ensure_configured_account(self.account.as_deref(), &account)?;
        Session::load_valid(&account).await
    }
}

fn ensure_configured_account(configured: Option<&str>, authenticated: &str) -> anyhow::Result<()> {
    match configured {
        Some(configured) if !configured.eq_ignore_ascii_case(authenticated) => anyhow::bail!(
            "Signed in as {authenticated}, but google_account is {configured}.\n\
            Sign in with {configured}, or update google_account in the config."
        ),
        _ => Ok(()),
    }
}

impl SessionProvider for GoogleSessionProvider {
    type Service = GoogleCalendar;

    async fn connect(&self) -> GameCalResult<GoogleCalendar> {
        let client = self
            .session()
            .await
            .and_then(|session| session.client())
            .map_err(|e| GameCalError::Session(format!("{:#}", e)))?;

        Ok(GoogleCalendar::new(client))
    }
}
