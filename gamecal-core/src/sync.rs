//! Pushes parsed games into a calendar, one event per game.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarService, EventTime, NewEvent, SessionProvider, TimeWindow};
use crate::config::GameCalConfig;
use crate::error::{GameCalError, GameCalResult};
use crate::game::GameRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Live,
    /// Report what would be created without touching the calendar.
    DryRun,
}

/// What happened to one game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameOutcome {
    Created { opponent: String, event_id: String },
    SkippedDuplicate { opponent: String, summary: String },
    SkippedBeforeResume { opponent: String },
    Planned { opponent: String, event: NewEvent },
}

impl GameOutcome {
    pub fn opponent(&self) -> &str {
        match self {
            GameOutcome::Created { opponent, .. }
            | GameOutcome::SkippedDuplicate { opponent, .. }
            | GameOutcome::SkippedBeforeResume { opponent }
            | GameOutcome::Planned { opponent, .. } => opponent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub outcomes: Vec<GameOutcome>,
    /// False when a resume opponent was given but never seen.
    pub resume_point_found: bool,
}

impl SyncReport {
    /// (created, duplicates, skipped before the resume point)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.outcomes.iter().fold((0, 0, 0), |(c, d, r), outcome| match outcome {
            GameOutcome::Created { .. } => (c + 1, d, r),
            GameOutcome::SkippedDuplicate { .. } => (c, d + 1, r),
            GameOutcome::SkippedBeforeResume { .. } => (c, d, r + 1),
            GameOutcome::Planned { .. } => (c, d, r),
        })
    }
}

/// A sync run that stopped at `opponent`. Games after it were not attempted.
#[derive(Error, Debug)]
#[error("Error creating event for {opponent}: {source}")]
pub struct SyncAbort {
    pub opponent: String,
    pub source: GameCalError,
    /// Everything handled before the failure.
    pub report: SyncReport,
}

/// How events are built from games.
#[derive(Debug, Clone)]
pub struct EventTemplate {
    pub calendar_id: String,
    pub title: String,
    pub description: String,
    pub time_zone: chrono_tz::Tz,
    pub duration: chrono::Duration,
    pub duplicate_window: chrono::Duration,
}

impl Default for EventTemplate {
    fn default() -> Self {
        Self::from_config(&GameCalConfig::default())
    }
}

impl EventTemplate {
    pub fn from_config(config: &GameCalConfig) -> Self {
        EventTemplate {
            calendar_id: config.calendar_id.clone(),
            title: config.title_template.clone(),
            description: config.description_template.clone(),
            time_zone: config.time_zone,
            duration: config.event_duration,
            duplicate_window: config.duplicate_window,
        }
    }

    pub fn summary(&self, game: &GameRecord) -> String {
        self.title.replace("{opponent}", game.opponent_name())
    }

    pub fn event(&self, game: &GameRecord) -> NewEvent {
        let start = game.kickoff.with_timezone(&self.time_zone);
        let end = start + self.duration;
        let zone = self.time_zone.name().to_string();

        NewEvent {
            summary: self.summary(game),
            location: game.location.clone(),
            description: self.description.replace("{opponent}", game.opponent_name()),
            start: EventTime {
                date_time: start.naive_local(),
                time_zone: zone.clone(),
            },
            end: EventTime {
                date_time: end.naive_local(),
                time_zone: zone,
            },
            use_default_reminders: true,
        }
    }
}

pub struct Synchronizer<P> {
    provider: P,
    template: EventTemplate,
}

impl<P: SessionProvider> Synchronizer<P> {
    pub fn new(provider: P, template: EventTemplate) -> Self {
        Synchronizer { provider, template }
    }

    /// Create an event for every game from `resume_after` on (or for all
    /// games), skipping those already in the calendar.
    ///
    /// Stops at the first game that fails; later games are left alone.
    /// A dry run plans every game and ignores `resume_after`.
    pub async fn synchronize(
        &self,
        games: &[GameRecord],
        resume_after: Option<&str>,
        mode: SyncMode,
    ) -> Result<SyncReport, SyncAbort> {
        let resume_after = resume_after.map(str::trim);

        if mode == SyncMode::DryRun {
            return Ok(self.plan(games, resume_after));
        }

        let mut admitting = resume_after.is_none();
        let mut report = SyncReport::default();
        let mut service: Option<P::Service> = None;

        for game in games {
            let opponent = game.opponent_name();

            if !admitting {
                if Some(opponent) == resume_after {
                    admitting = true;
                } else {
                    debug!(opponent, "Skipping game before resume point");
                    report.outcomes.push(GameOutcome::SkippedBeforeResume {
                        opponent: opponent.to_string(),
                    });
                    continue;
                }
            }

            let result = match service {
                Some(ref service) => self.sync_game(service, game).await,
                None => match self.provider.connect().await {
                    Ok(connected) => self.sync_game(service.insert(connected), game).await,
                    Err(e) => Err(e),
                },
            };

            match result {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(source) => {
                    report.resume_point_found = admitting;
                    return Err(SyncAbort {
                        opponent: opponent.to_string(),
                        source,
                        report,
                    });
                }
            }
        }

        report.resume_point_found = admitting;
        Ok(report)
    }

    fn plan(&self, games: &[GameRecord], resume_after: Option<&str>) -> SyncReport {
        let outcomes = games
            .iter()
            .map(|game| GameOutcome::Planned {
                opponent: game.opponent_name().to_string(),
                event: self.template.event(game),
            })
            .collect();

        SyncReport {
            outcomes,
            resume_point_found: resume_after
                .is_none_or(|name| games.iter().any(|game| game.opponent_name() == name)),
        }
    }

    async fn sync_game(&self, service: &P::Service, game: &GameRecord) -> GameCalResult<GameOutcome> {
        let opponent = game.opponent_name().to_string();
        let summary = self.template.summary(game);

        if self.event_exists(service, &summary, game).await {
            info!(%summary, "Skipping existing event");
            return Ok(GameOutcome::SkippedDuplicate { opponent, summary });
        }

        let event = self.template.event(game);
        let created = service
            .insert_event(&self.template.calendar_id, &event)
            .await
            .map_err(|e| match e {
                GameCalError::EventCreation(_) => e,
                other => GameCalError::EventCreation(other.to_string()),
            })?;

        info!(%opponent, event_id = %created.id, "Created calendar event");
        Ok(GameOutcome::Created {
            opponent,
            event_id: created.id,
        })
    }

    /// A failed lookup counts as "not found": a possible duplicate is
    /// preferred over a missing game.
    async fn event_exists(&self, service: &P::Service, summary: &str, game: &GameRecord) -> bool {
        let window = TimeWindow::around(game.kickoff.with_timezone(&Utc), self.template.duplicate_window);

        match service
            .list_events(&self.template.calendar_id, &window, summary)
            .await
        {
            Ok(events) => events.iter().any(|event| event.summary == summary),
            Err(e) => {
                let e = GameCalError::DuplicateCheck(e.to_string());
                warn!(%summary, "{e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use chrono::{DateTime, Duration, TimeZone};
    use chrono_tz::America::New_York;

    use super::*;
    use crate::calendar::ExistingEvent;

    #[derive(Default)]
    struct CalendarState {
        existing: Vec<ExistingEvent>,
        queries: Vec<(TimeWindow, String)>,
        inserted: Vec<NewEvent>,
        fail_insert_for: Option<String>,
        fail_queries: bool,
    }

    #[derive(Clone, Default)]
    struct FakeCalendar {
        state: Rc<RefCell<CalendarState>>,
    }

    impl CalendarService for FakeCalendar {
        async fn list_events(
            &self,
            _calendar_id: &str,
            window: &TimeWindow,
            query: &str,
        ) -> GameCalResult<Vec<ExistingEvent>> {
            let mut state = self.state.borrow_mut();
            state.queries.push((*window, query.to_string()));

            if state.fail_queries {
                return Err(GameCalError::Provider("rate limited".into()));
            }

            Ok(state
                .existing
                .iter()
                .filter(|e| e.start.is_some_and(|s| s >= window.from && s <= window.to))
                .filter(|e| e.summary.contains(query))
                .cloned()
                .collect())
        }

        async fn insert_event(&self, _calendar_id: &str, event: &NewEvent) -> GameCalResult<ExistingEvent> {
            let mut state = self.state.borrow_mut();

            if state
                .fail_insert_for
                .as_deref()
                .is_some_and(|name| event.summary.ends_with(name))
            {
                return Err(GameCalError::Provider("backend unavailable".into()));
            }

            state.inserted.push(event.clone());
            Ok(ExistingEvent {
                id: format!("evt{}", state.inserted.len()),
                summary: event.summary.clone(),
                start: None,
            })
        }
    }

    #[derive(Default)]
    struct FakeSessions {
        calendar: FakeCalendar,
        connects: Cell<usize>,
        refuse: bool,
    }

    impl SessionProvider for &FakeSessions {
        type Service = FakeCalendar;

        async fn connect(&self) -> GameCalResult<FakeCalendar> {
            self.connects.set(self.connects.get() + 1);
            if self.refuse {
                return Err(GameCalError::Session("token revoked".into()));
            }
            Ok(self.calendar.clone())
        }
    }

    fn kickoff(day: u32, hour: u32) -> DateTime<chrono_tz::Tz> {
        New_York.with_ymd_and_hms(2024, 12, day, hour, 0, 0).unwrap()
    }

    fn game(opponent: &str, day: u32) -> GameRecord {
        GameRecord {
            kickoff: kickoff(day, 19),
            opponent: opponent.to_string(),
            location: "Rupp Arena".to_string(),
        }
    }

    fn synchronizer(sessions: &FakeSessions) -> Synchronizer<&FakeSessions> {
        Synchronizer::new(sessions, EventTemplate::default())
    }

    fn opponents(report: &SyncReport) -> Vec<&str> {
        report.outcomes.iter().map(GameOutcome::opponent).collect()
    }

    #[tokio::test]
    async fn test_creates_events_for_all_games() {
        let sessions = FakeSessions::default();
        let games = [game("Duke", 3), game(" Gonzaga ", 7)];

        let report = synchronizer(&sessions)
            .synchronize(&games, None, SyncMode::Live)
            .await
            .unwrap();

        assert_eq!(report.counts(), (2, 0, 0));
        assert!(report.resume_point_found);
        assert_eq!(sessions.connects.get(), 1);

        let state = sessions.calendar.state.borrow();
        assert_eq!(state.inserted.len(), 2);

        let gonzaga = &state.inserted[1];
        assert_eq!(gonzaga.summary, "Kentucky Basketball vs Gonzaga");
        assert_eq!(gonzaga.description, "Kentucky Wildcats basketball game against Gonzaga");
        assert_eq!(gonzaga.location, "Rupp Arena");
        assert_eq!(gonzaga.start.date_time, kickoff(7, 19).naive_local());
        assert_eq!(gonzaga.end.date_time, kickoff(7, 21).naive_local());
        assert_eq!(gonzaga.start.time_zone, "America/New_York");
        assert_eq!(gonzaga.end.time_zone, "America/New_York");
        assert!(gonzaga.use_default_reminders);
    }

    #[tokio::test]
    async fn test_duplicate_query_uses_one_minute_window() {
        let sessions = FakeSessions::default();
        let games = [game("Duke", 3)];

        synchronizer(&sessions)
            .synchronize(&games, None, SyncMode::Live)
            .await
            .unwrap();

        let state = sessions.calendar.state.borrow();
        let (window, query) = &state.queries[0];
        let start = kickoff(3, 19).with_timezone(&Utc);
        assert_eq!(window.from, start - Duration::minutes(1));
        assert_eq!(window.to, start + Duration::minutes(1));
        assert_eq!(query, "Kentucky Basketball vs Duke");
    }

    #[tokio::test]
    async fn test_resume_after_skips_earlier_games() {
        let sessions = FakeSessions::default();
        let games = [game("Ohio State", 1), game("Brown", 3), game("Louisville", 5)];

        let report = synchronizer(&sessions)
            .synchronize(&games, Some(" Brown"), SyncMode::Live)
            .await
            .unwrap();

        assert_eq!(
            report.outcomes[0],
            GameOutcome::SkippedBeforeResume {
                opponent: "Ohio State".into()
            }
        );
        assert_eq!(report.counts(), (2, 0, 1));

        let state = sessions.calendar.state.borrow();
        let queried: Vec<_> = state.queries.iter().map(|(_, q)| q.as_str()).collect();
        assert_eq!(
            queried,
            ["Kentucky Basketball vs Brown", "Kentucky Basketball vs Louisville"]
        );
        assert_eq!(state.inserted.len(), 2);
    }

    #[tokio::test]
    async fn test_resume_point_never_found() {
        let sessions = FakeSessions::default();
        let games = [game("Duke", 3), game("Gonzaga", 7)];

        let report = synchronizer(&sessions)
            .synchronize(&games, Some("Brown"), SyncMode::Live)
            .await
            .unwrap();

        assert!(!report.resume_point_found);
        assert_eq!(report.counts(), (0, 0, 2));
        // Nothing was admitted, so no session was needed
        assert_eq!(sessions.connects.get(), 0);
    }

    #[tokio::test]
    async fn test_existing_events_are_not_recreated() {
        let sessions = FakeSessions::default();
        sessions.calendar.state.borrow_mut().existing.push(ExistingEvent {
            id: "abc".into(),
            summary: "Kentucky Basketball vs Duke".into(),
            start: Some(kickoff(3, 19).with_timezone(&Utc) + Duration::seconds(30)),
        });

        let games = [game("Duke", 3), game("Duke", 3)];
        let report = synchronizer(&sessions)
            .synchronize(&games, None, SyncMode::Live)
            .await
            .unwrap();

        assert_eq!(report.counts(), (0, 2, 0));
        assert!(sessions.calendar.state.borrow().inserted.is_empty());
    }

    #[tokio::test]
    async fn test_similar_title_is_not_a_duplicate() {
        let sessions = FakeSessions::default();
        sessions.calendar.state.borrow_mut().existing.push(ExistingEvent {
            id: "abc".into(),
            summary: "Kentucky Basketball vs Duke (Watch Party)".into(),
            start: Some(kickoff(3, 19).with_timezone(&Utc)),
        });

        let report = synchronizer(&sessions)
            .synchronize(&[game("Duke", 3)], None, SyncMode::Live)
            .await
            .unwrap();

        assert_eq!(report.counts(), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_failed_duplicate_check_still_inserts() {
        let sessions = FakeSessions::default();
        sessions.calendar.state.borrow_mut().fail_queries = true;

        let report = synchronizer(&sessions)
            .synchronize(&[game("Duke", 3)], None, SyncMode::Live)
            .await
            .unwrap();

        assert_eq!(report.counts(), (1, 0, 0));
        assert_eq!(sessions.calendar.state.borrow().inserted.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_failure_stops_the_run() {
        let sessions = FakeSessions::default();
        sessions.calendar.state.borrow_mut().fail_insert_for = Some("Clemson".into());

        let games = [game("Duke", 3), game("Gonzaga", 7), game("Clemson", 10), game("Florida", 14)];
        let abort = synchronizer(&sessions)
            .synchronize(&games, None, SyncMode::Live)
            .await
            .unwrap_err();

        assert_eq!(abort.opponent, "Clemson");
        assert!(matches!(abort.source, GameCalError::EventCreation(ref msg) if msg.contains("backend unavailable")));
        assert_eq!(opponents(&abort.report), ["Duke", "Gonzaga"]);
        assert!(abort.to_string().contains("Clemson"));

        let state = sessions.calendar.state.borrow();
        let queried: Vec<_> = state.queries.iter().map(|(_, q)| q.as_str()).collect();
        assert!(!queried.iter().any(|q| q.contains("Florida")));
        assert_eq!(state.inserted.len(), 2);
    }

    #[tokio::test]
    async fn test_session_failure_names_first_admitted_game() {
        let sessions = FakeSessions {
            refuse: true,
            ..Default::default()
        };
        let games = [game("Ohio State", 1), game("Brown", 3), game("Louisville", 5)];

        let abort = synchronizer(&sessions)
            .synchronize(&games, Some("Brown"), SyncMode::Live)
            .await
            .unwrap_err();

        assert_eq!(abort.opponent, "Brown");
        assert!(matches!(abort.source, GameCalError::Session(_)));
        assert_eq!(sessions.connects.get(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_calls() {
        let sessions = FakeSessions::default();
        sessions.calendar.state.borrow_mut().fail_queries = true;
        let games = [game("Duke", 3), game("Gonzaga", 7)];

        let report = synchronizer(&sessions)
            .synchronize(&games, None, SyncMode::DryRun)
            .await
            .unwrap();

        assert_eq!(sessions.connects.get(), 0);
        let state = sessions.calendar.state.borrow();
        assert!(state.queries.is_empty());
        assert!(state.inserted.is_empty());

        assert_eq!(opponents(&report), ["Duke", "Gonzaga"]);
        match &report.outcomes[1] {
            GameOutcome::Planned { event, .. } => {
                assert_eq!(event.summary, "Kentucky Basketball vs Gonzaga")
            }
            other => panic!("expected a planned event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dry_run_lists_games_before_resume_point() {
        let sessions = FakeSessions::default();
        let games = [game("Ohio State", 1), game("Brown", 3), game("Louisville", 5)];

        let report = synchronizer(&sessions)
            .synchronize(&games, Some("Brown"), SyncMode::DryRun)
            .await
            .unwrap();

        assert_eq!(opponents(&report), ["Ohio State", "Brown", "Louisville"]);
        assert!(report
            .outcomes
            .iter()
            .all(|outcome| matches!(outcome, GameOutcome::Planned { .. })));
        assert_eq!(report.counts(), (0, 0, 0));
        assert!(report.resume_point_found);
        assert_eq!(sessions.connects.get(), 0);

        let missing = synchronizer(&sessions)
            .synchronize(&games, Some("Duke"), SyncMode::DryRun)
            .await
            .unwrap();
        assert_eq!(missing.outcomes.len(), 3);
        assert!(!missing.resume_point_found);
    }

    #[test]
    fn test_template_handles_custom_zone_and_duration() {
        let template = EventTemplate {
            title: "{opponent} @ UK".into(),
            time_zone: chrono_tz::America::Chicago,
            duration: Duration::minutes(150),
            ..EventTemplate::default()
        };

        let event = template.event(&game("Duke", 3));

        assert_eq!(event.summary, "Duke @ UK");
        assert_eq!(event.start.time_zone, "America/Chicago");
        assert_eq!(event.start.date_time.to_string(), "2024-12-03 18:00:00");
        assert_eq!(event.end.date_time.to_string(), "2024-12-03 20:30:00");
    }
}
