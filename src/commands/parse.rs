use std::path::Path;

use anyhow::{Context, Result};
use gamecal_core::config::GameCalConfig;
use gamecal_core::schedule::{ParsedSchedule, ScheduleParser};
use owo_colors::OwoColorize;

use crate::render::{Render, pluralize};

pub fn load_schedule(
    config: &GameCalConfig,
    file: &Path,
    max_games: Option<usize>,
) -> Result<ParsedSchedule> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read schedule from {}", file.display()))?;

    let parser = ScheduleParser::from_config(config)?;
    Ok(parser.parse(&html, max_games))
}

pub fn run(config: &GameCalConfig, file: &Path, max_games: Option<usize>, json: bool) -> Result<()> {
    let schedule = load_schedule(config, file, max_games)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schedule.games)?);
        return Ok(());
    }

    print_skipped(&schedule);

    if schedule.games.is_empty() {
        println!("{}", "No upcoming games found".dimmed());
        return Ok(());
    }

    println!(
        "{} upcoming {}:",
        schedule.games.len(),
        pluralize("game", schedule.games.len())
    );
    for game in &schedule.games {
        println!("   {}", game.render());
    }

    Ok(())
}

pub fn print_skipped(schedule: &ParsedSchedule) {
    if schedule.skipped.is_empty() {
        return;
    }

    println!("{}", "Skipped entries:".dimmed());
    for entry in &schedule.skipped {
        println!("   {}", entry.render());
    }
    println!();
}
