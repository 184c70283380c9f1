//! gamecal configuration.

use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

use crate::completion::{CompletionClassifier, DEFAULT_SCRIMMAGE_TEAMS};
use crate::datetime::{ENGLISH_MONTHS, MonthTable, SeasonConfig};
use crate::error::{GameCalError, GameCalResult};

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TIME_ZONE: &str = "America/New_York";
pub const DEFAULT_TITLE_TEMPLATE: &str = "Kentucky Basketball vs {opponent}";
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Kentucky Wildcats basketball game against {opponent}";

/// Four-digit years whose following year is still four digits.
const SEASON_START_YEARS: std::ops::RangeInclusive<i32> = 1000..=9998;

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_time_zone() -> Tz {
    chrono_tz::America::New_York
}

fn default_title_template() -> String {
    DEFAULT_TITLE_TEMPLATE.to_string()
}

fn default_description_template() -> String {
    DEFAULT_DESCRIPTION_TEMPLATE.to_string()
}

fn default_event_duration() -> Duration {
    Duration::hours(2)
}

fn default_duplicate_window() -> Duration {
    Duration::minutes(1)
}

fn default_scrimmage_teams() -> Vec<String> {
    DEFAULT_SCRIMMAGE_TEAMS.map(String::from).to_vec()
}

fn default_months() -> Vec<String> {
    ENGLISH_MONTHS.map(String::from).to_vec()
}

fn check_duration(field: &str, value: Duration, max: Duration) -> GameCalResult<()> {
    if value <= Duration::zero() || value > max {
        return Err(GameCalError::Config(format!(
            "{field} must be longer than zero and at most {}, got {}",
            humantime::format_duration(max.to_std().unwrap_or_default()),
            humantime::format_duration(value.to_std().unwrap_or_default())
        )));
    }
    Ok(())
}

fn deserialize_time_zone<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Tz, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse::<Tz>()
        .map_err(|_| serde::de::Error::custom(format!("unknown time zone '{name}'")))
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    let duration = humantime::parse_duration(&text)
        .map_err(|e| serde::de::Error::custom(format!("invalid duration '{text}': {e}")))?;
    Duration::from_std(duration)
        .map_err(|_| serde::de::Error::custom(format!("duration '{text}' is out of range")))
}

/// Configuration at ~/.config/gamecal/config.toml
///
/// Every field is optional; a missing file means the defaults, which target
/// the Kentucky men's basketball schedule page.
#[derive(Debug, Clone, Deserialize)]
pub struct GameCalConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Account whose stored session is used for live syncs.
    pub google_account: Option<String>,

    #[serde(default = "default_time_zone", deserialize_with = "deserialize_time_zone")]
    pub time_zone: Tz,

    #[serde(default = "default_title_template")]
    pub title_template: String,

    #[serde(default = "default_description_template")]
    pub description_template: String,

    #[serde(default = "default_event_duration", deserialize_with = "deserialize_duration")]
    pub event_duration: Duration,

    #[serde(default = "default_duplicate_window", deserialize_with = "deserialize_duration")]
    pub duplicate_window: Duration,

    #[serde(default = "default_scrimmage_teams")]
    pub scrimmage_teams: Vec<String>,

    #[serde(default = "default_months")]
    pub months: Vec<String>,

    #[serde(default)]
    pub season: SeasonConfig,
}

impl Default for GameCalConfig {
    fn default() -> Self {
        GameCalConfig {
            calendar_id: default_calendar_id(),
            google_account: None,
            time_zone: default_time_zone(),
            title_template: default_title_template(),
            description_template: default_description_template(),
            event_duration: default_event_duration(),
            duplicate_window: default_duplicate_window(),
            scrimmage_teams: default_scrimmage_teams(),
            months: default_months(),
            season: SeasonConfig::default(),
        }
    }
}

impl GameCalConfig {
    pub fn config_path() -> GameCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| GameCalError::Config("Could not determine config directory".into()))?
            .join("gamecal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from ~/.config/gamecal/config.toml, falling back to defaults.
    pub fn load() -> GameCalResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> GameCalResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| GameCalError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> GameCalResult<Self> {
        let config: GameCalConfig =
            toml::from_str(content).map_err(|e| GameCalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> GameCalResult<()> {
        if !(1..=12).contains(&self.season.start_month) {
            return Err(GameCalError::Config(format!(
                "season.start_month must be between 1 and 12, got {}",
                self.season.start_month
            )));
        }

        if let Some(year) = self.season.start_year {
            if !SEASON_START_YEARS.contains(&year) {
                return Err(GameCalError::Config(format!(
                    "season.start_year must be between {} and {}, got {year}",
                    SEASON_START_YEARS.start(),
                    SEASON_START_YEARS.end()
                )));
            }
        }

        check_duration("event_duration", self.event_duration, Duration::days(7))?;
        check_duration("duplicate_window", self.duplicate_window, Duration::days(1))?;

        if !self.title_template.contains("{opponent}") {
            return Err(GameCalError::Config(
                "title_template must contain {opponent}".into(),
            ));
        }

        self.month_table()?;

        Ok(())
    }

    pub fn month_table(&self) -> GameCalResult<MonthTable> {
        MonthTable::new(self.months.as_slice())
    }

    pub fn classifier(&self) -> CompletionClassifier {
        CompletionClassifier::new(self.scrimmage_teams.as_slice())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> GameCalResult<()> {
        let contents = format!(
            "\
# gamecal configuration

# Calendar that receives the games:
# calendar_id = \"{DEFAULT_CALENDAR_ID}\"

# Google account used for live syncs (set by `gamecal auth`):
# google_account = \"you@example.com\"

# Zone the schedule page's times are in:
# time_zone = \"{DEFAULT_TIME_ZONE}\"

# Event text, {{opponent}} is replaced with the opponent's name:
# title_template = \"{DEFAULT_TITLE_TEMPLATE}\"
# description_template = \"{DEFAULT_DESCRIPTION_TEMPLATE}\"

# How long each event lasts:
# event_duration = \"2h\"

# How close an existing event's start must be to count as a duplicate:
# duplicate_window = \"1m\"

# Team names used in intra-squad scrimmage scores (\"Blue 67, White 66\"):
# scrimmage_teams = [\"Blue\", \"White\"]

# Month abbreviations as printed on the schedule page:
# months = [\"Jan\", \"Feb\", \"Mar\", \"Apr\", \"May\", \"Jun\", \"Jul\", \"Aug\", \"Sep\", \"Oct\", \"Nov\", \"Dec\"]

# [season]
# Year the season starts in (defaults to the season running today):
# start_year = 2024
# First month that belongs to the start year:
# start_month = 10
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GameCalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| GameCalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GameCalConfig::from_toml("").unwrap();

        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.time_zone, chrono_tz::America::New_York);
        assert_eq!(config.event_duration, Duration::hours(2));
        assert_eq!(config.duplicate_window, Duration::minutes(1));
        assert_eq!(config.season.start_month, 10);
        assert_eq!(config.season.start_year, None);
        assert_eq!(config.scrimmage_teams, vec!["Blue", "White"]);
    }

    #[test]
    fn test_full_config() {
        let config = GameCalConfig::from_toml(
            r#"
            calendar_id = "games@group.calendar.google.com"
            google_account = "fan@example.com"
            time_zone = "America/Chicago"
            title_template = "Louisville at {opponent}"
            event_duration = "2h 30m"
            scrimmage_teams = ["Red", "Black"]

            [season]
            start_year = 2025
            start_month = 11
            "#,
        )
        .unwrap();

        assert_eq!(config.google_account.as_deref(), Some("fan@example.com"));
        assert_eq!(config.time_zone, chrono_tz::America::Chicago);
        assert_eq!(config.event_duration, Duration::minutes(150));
        assert_eq!(config.season, SeasonConfig::starting(2025, 11));
        assert!(config.classifier().is_completed("Red 40"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(GameCalConfig::from_toml(r#"time_zone = "Mars/Olympus""#).is_err());
        assert!(GameCalConfig::from_toml(r#"event_duration = "soon""#).is_err());
        assert!(GameCalConfig::from_toml(r#"months = ["Jan"]"#).is_err());
        assert!(GameCalConfig::from_toml(r#"title_template = "Game day""#).is_err());
        assert!(GameCalConfig::from_toml("[season]\nstart_month = 13").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_durations() {
        for value in ["1000000years", "8days", "0s"] {
            let toml = format!(r#"event_duration = "{value}""#);
            let err = GameCalConfig::from_toml(&toml).unwrap_err();
            assert!(err.to_string().contains("event_duration"), "{value}: {err}");
        }

        assert!(GameCalConfig::from_toml(r#"duplicate_window = "2days""#).is_err());
        assert!(GameCalConfig::from_toml(r#"event_duration = "7days""#).is_ok());
    }

    #[test]
    fn test_rejects_unrepresentable_start_year() {
        let err = GameCalConfig::from_toml(&format!("[season]\nstart_year = {}", i32::MAX)).unwrap_err();
        assert!(err.to_string().contains("season.start_year"));

        assert!(GameCalConfig::from_toml("[season]\nstart_year = 999").is_err());
        assert!(GameCalConfig::from_toml("[season]\nstart_year = 9998").is_ok());
    }

    #[test]
    fn test_default_config_file_parses() {
        let dir = std::env::temp_dir().join(format!("gamecal-config-{}", std::process::id()));
        let path = dir.join("config.toml");

        GameCalConfig::create_default_config(&path).unwrap();
        let config = GameCalConfig::load_from(&path).unwrap();
        assert_eq!(config.calendar_id, "primary");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = GameCalConfig::load_from(Path::new("/nonexistent/gamecal.toml")).unwrap();
        assert_eq!(config.title_template, DEFAULT_TITLE_TEMPLATE);
    }
}
