//! Extracts upcoming games from a team's schedule page.
//!
//! The page is a flat list of `div.schedule-item` blocks:
//!
//! ```html
//! <div class="schedule-item">
//!   <time><span>Nov.</span><span>23</span></time>
//!   <div class="schedule-item__team">
//!     <h3>Duke</h3>
//!     <p>Atlanta, Ga.</p>
//!   </div>
//!   <span class="schedule-item__result">7:00 PM</span>
//! </div>
//! ```
//!
//! The result span holds the start time for upcoming games and the score for
//! finished ones. The date carries no year, so it is inferred from the
//! season.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::completion::CompletionClassifier;
use crate::config::GameCalConfig;
use crate::datetime::{MonthTable, SeasonConfig, TBA_TIME};
use crate::error::{GameCalError, GameCalResult};
use crate::game::GameRecord;

const TBA: &str = "TBA";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("div.schedule-item"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("time"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static TEAM: LazyLock<Selector> = LazyLock::new(|| selector("div.schedule-item__team"));
static OPPONENT: LazyLock<Selector> = LazyLock::new(|| selector("h3"));
static VENUE: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static RESULT: LazyLock<Selector> = LazyLock::new(|| selector("span.schedule-item__result"));

/// Why a schedule entry did not become a game.
#[derive(Debug)]
pub enum SkipReason {
    /// The result slot holds a score.
    Completed { result: String },
    /// Starts before parsing began.
    Past { kickoff: DateTime<Tz> },
    Invalid { error: GameCalError },
}

#[derive(Debug)]
pub struct SkippedEntry {
    pub opponent: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct ParsedSchedule {
    pub games: Vec<GameRecord>,
    pub skipped: Vec<SkippedEntry>,
}

/// Fields of one `schedule-item`, still as page text.
struct RawScheduleEntry {
    month: String,
    day: String,
    result: String,
    opponent: String,
    location: String,
}

impl RawScheduleEntry {
    fn extract(item: ElementRef<'_>) -> GameCalResult<Self> {
        // The opponent is looked up first so that later failures can name it.
        let team = item.select(&TEAM).next();
        let opponent = team
            .and_then(|t| t.select(&OPPONENT).next())
            .map(element_text);

        let missing = |field: &'static str| GameCalError::ParseFieldMissing {
            field,
            opponent: opponent.clone(),
        };

        let date = item.select(&DATE).next().ok_or_else(|| missing("date"))?;
        let mut date_spans = date.select(&SPAN);
        let month = date_spans
            .next()
            .map(|s| element_text(s).replace('.', ""))
            .ok_or_else(|| missing("month"))?;
        let day = date_spans
            .next()
            .map(element_text)
            .ok_or_else(|| missing("day"))?;

        let team = team.ok_or_else(|| missing("team info"))?;
        let location = team
            .select(&VENUE)
            .next()
            .map(element_text)
            .ok_or_else(|| missing("location"))?;

        let result = item
            .select(&RESULT)
            .next()
            .map(element_text)
            .unwrap_or_else(|| TBA.to_string());

        Ok(RawScheduleEntry {
            month,
            day,
            result,
            opponent: opponent.clone().ok_or_else(|| missing("opponent"))?,
            location,
        })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub struct ScheduleParser {
    months: MonthTable,
    season: SeasonConfig,
    classifier: CompletionClassifier,
    time_zone: Tz,
}

impl Default for ScheduleParser {
    fn default() -> Self {
        ScheduleParser {
            months: MonthTable::default(),
            season: SeasonConfig::default(),
            classifier: CompletionClassifier::default(),
            time_zone: chrono_tz::America::New_York,
        }
    }
}

impl ScheduleParser {
    pub fn from_config(config: &GameCalConfig) -> GameCalResult<Self> {
        Ok(ScheduleParser {
            months: config.month_table()?,
            season: config.season,
            classifier: config.classifier(),
            time_zone: config.time_zone,
        })
    }

    pub fn with_season(mut self, season: SeasonConfig) -> Self {
        self.season = season;
        self
    }

    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Parse the games that haven't started yet.
    pub fn parse(&self, document: &str, max_games: Option<usize>) -> ParsedSchedule {
        self.parse_at(document, max_games, Utc::now())
    }

    /// Parse relative to a fixed `now`, which is evaluated once for the
    /// whole document.
    pub fn parse_at(
        &self,
        document: &str,
        max_games: Option<usize>,
        now: DateTime<Utc>,
    ) -> ParsedSchedule {
        let html = Html::parse_document(document);
        let now = now.with_timezone(&self.time_zone);
        let mut schedule = ParsedSchedule::default();

        for item in html.select(&ITEM) {
            if max_games.is_some_and(|max| schedule.games.len() >= max) {
                break;
            }

            match self.parse_entry(item, &now) {
                Ok(game) => schedule.games.push(game),
                Err(skipped) => {
                    let opponent = skipped.opponent.as_deref().unwrap_or("unknown opponent");
                    match &skipped.reason {
                        SkipReason::Completed { result } => {
                            debug!(opponent, %result, "Skipping completed game")
                        }
                        SkipReason::Past { kickoff } => {
                            debug!(opponent, %kickoff, "Skipping past game")
                        }
                        SkipReason::Invalid { error } => {
                            warn!(opponent, "Error parsing game: {error}")
                        }
                    }
                    schedule.skipped.push(skipped);
                }
            }
        }

        schedule
    }

    fn parse_entry(&self, item: ElementRef<'_>, now: &DateTime<Tz>) -> Result<GameRecord, SkippedEntry> {
        let entry = RawScheduleEntry::extract(item).map_err(|error| SkippedEntry {
            opponent: match &error {
                GameCalError::ParseFieldMissing { opponent, .. } => opponent.clone(),
                _ => None,
            },
            reason: SkipReason::Invalid { error },
        })?;

        let skip = |reason| SkippedEntry {
            opponent: Some(entry.opponent.clone()),
            reason,
        };

        let year = self
            .season
            .year_for(self.months.month_number(&entry.month), now.date_naive());
        let date_text = format!("{} {} {}", entry.month, entry.day, year);

        if self.classifier.is_completed(&entry.result) {
            return Err(skip(SkipReason::Completed {
                result: entry.result.clone(),
            }));
        }

        let time_text = if entry.result == TBA { TBA_TIME } else { entry.result.as_str() };

        let kickoff = self
            .months
            .normalize(&date_text, time_text)
            .and_then(|naive| self.localize(naive, &date_text, time_text))
            .map_err(|error| skip(SkipReason::Invalid { error }))?;

        if kickoff < *now {
            return Err(skip(SkipReason::Past { kickoff }));
        }

        Ok(GameRecord {
            kickoff,
            opponent: entry.opponent,
            location: entry.location,
        })
    }

    /// Attach the schedule's zone. Ambiguous fall-back times take the first
    /// occurrence; times skipped by a spring-forward don't exist.
    fn localize(&self, naive: NaiveDateTime, date: &str, time: &str) -> GameCalResult<DateTime<Tz>> {
        self.time_zone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                GameCalError::format(
                    date,
                    time,
                    format!("{naive} does not exist in {}", self.time_zone),
                )
            })
    }
}
