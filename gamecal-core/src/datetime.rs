//! Turns the loose date and time fragments found on schedule pages into
//! timestamps.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{GameCalError, GameCalResult};

pub const ENGLISH_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Time used for games whose start time hasn't been announced.
pub const TBA_TIME: &str = "12:00 PM";

static ENGLISH: LazyLock<MonthTable> = LazyLock::new(MonthTable::default);

/// Normalize using the English month table.
pub fn normalize(date_fragment: &str, time_fragment: &str) -> GameCalResult<NaiveDateTime> {
    ENGLISH.normalize(date_fragment, time_fragment)
}

/// Month abbreviations in calendar order (index 0 is January).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthTable {
    abbreviations: [String; 12],
}

impl Default for MonthTable {
    fn default() -> Self {
        MonthTable {
            abbreviations: ENGLISH_MONTHS.map(String::from),
        }
    }
}

impl MonthTable {
    pub fn new<S: AsRef<str>>(abbreviations: &[S]) -> GameCalResult<Self> {
        let names: Vec<String> = abbreviations
            .iter()
            .map(|s| s.as_ref().trim().trim_end_matches('.').to_string())
            .collect();

        let abbreviations: [String; 12] = names.try_into().map_err(|names: Vec<String>| {
            GameCalError::Config(format!(
                "Month table needs exactly 12 entries, got {}",
                names.len()
            ))
        })?;

        if let Some(empty) = abbreviations.iter().position(|s| s.is_empty()) {
            return Err(GameCalError::Config(format!(
                "Month table entry {} is empty",
                empty + 1
            )));
        }

        Ok(MonthTable { abbreviations })
    }

    /// Month number (1-12) for an abbreviation. A trailing period is ignored.
    pub fn month_number(&self, abbreviation: &str) -> Option<u32> {
        let abbreviation = abbreviation.trim().trim_end_matches('.');
        self.abbreviations
            .iter()
            .position(|m| m == abbreviation)
            .map(|i| i as u32 + 1)
    }

    /// Parse "[Weekday] Mon[.] D YYYY" plus "H:MM AM|PM".
    ///
    /// Only the last three tokens of the date are looked at, so leading
    /// weekday names are ignored whatever their spelling.
    pub fn normalize(&self, date_fragment: &str, time_fragment: &str) -> GameCalResult<NaiveDateTime> {
        let tokens: Vec<&str> = date_fragment.split_whitespace().collect();
        let [.., month, day, year] = tokens.as_slice() else {
            return Err(GameCalError::format(
                date_fragment,
                time_fragment,
                "expected month, day and year",
            ));
        };

        let month_number = self.month_number(month).ok_or_else(|| {
            GameCalError::format(
                date_fragment,
                time_fragment,
                format!("invalid month abbreviation: {}", month.trim_end_matches('.')),
            )
        })?;

        let day: u32 = day.parse().map_err(|_| {
            GameCalError::format(date_fragment, time_fragment, format!("invalid day: {day}"))
        })?;

        let year: i32 = match year.parse() {
            Ok(y) if year.len() == 4 => y,
            _ => {
                return Err(GameCalError::format(
                    date_fragment,
                    time_fragment,
                    format!("invalid year: {year}"),
                ));
            }
        };

        let date = NaiveDate::from_ymd_opt(year, month_number, day).ok_or_else(|| {
            GameCalError::format(date_fragment, time_fragment, "no such calendar date")
        })?;

        let time = parse_clock_time(time_fragment).ok_or_else(|| {
            GameCalError::format(date_fragment, time_fragment, "expected time like 7:00 PM")
        })?;

        Ok(date.and_time(time))
    }
}

/// 12-hour clock, "H:MM AM" or "HH:MM PM".
fn parse_clock_time(time_fragment: &str) -> Option<NaiveTime> {
    let time = time_fragment.trim().to_uppercase();
    let (clock, meridiem) = time.split_once(' ')?;
    let (hour, minute) = clock.split_once(':')?;

    if !(1..=2).contains(&hour.len()) || minute.len() != 2 || !matches!(meridiem.trim(), "AM" | "PM") {
        return None;
    }

    NaiveTime::parse_from_str(&format!("{hour}:{minute} {}", meridiem.trim()), "%I:%M %p").ok()
}

fn default_start_month() -> u32 {
    10
}

/// Which calendar year a month belongs to within a season that straddles
/// New Year.
///
/// Months from `start_month` through December belong to `start_year`,
/// everything else to the year after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonConfig {
    #[serde(default)]
    pub start_year: Option<i32>,

    #[serde(default = "default_start_month")]
    pub start_month: u32,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        SeasonConfig {
            start_year: None,
            start_month: default_start_month(),
        }
    }
}

impl SeasonConfig {
    /// A season configuration pinned to the given start year.
    pub fn starting(start_year: i32, start_month: u32) -> Self {
        SeasonConfig {
            start_year: Some(start_year),
            start_month,
        }
    }

    /// The configured start year, or the season running on `today`.
    pub fn start_year_on(&self, today: NaiveDate) -> i32 {
        self.start_year.unwrap_or_else(|| {
            if today.month() >= self.start_month {
                today.year()
            } else {
                today.year() - 1
            }
        })
    }

    /// Calendar year for `month`; unknown months land in the season's end year.
    pub fn year_for(&self, month: Option<u32>, today: NaiveDate) -> i32 {
        let start_year = self.start_year_on(today);
        match month {
            Some(m) if (self.start_month..=12).contains(&m) => start_year,
            _ => start_year.saturating_add(1),
        }
    }
}
