use std::path::Path;

use anyhow::Result;
use gamecal_core::config::GameCalConfig;
use gamecal_core::sync::{EventTemplate, SyncMode, Synchronizer};
use gamecal_provider_google::GoogleSessionProvider;
use owo_colors::OwoColorize;

use crate::commands::parse::{load_schedule, print_skipped};
use crate::render::{pluralize, render_report};
use crate::utils::tui;

pub struct SyncOptions {
    pub dry_run: bool,
    pub resume_after: Option<String>,
    pub max_games: Option<usize>,
    pub verbose: bool,
}

pub async fn run(config: &GameCalConfig, file: &Path, options: SyncOptions) -> Result<()> {
    let schedule = load_schedule(config, file, options.max_games)?;

    if options.verbose || options.dry_run {
        print_skipped(&schedule);
    }

    if schedule.games.is_empty() {
        println!("No upcoming games found to process");
        return Ok(());
    }

    let mode = if options.dry_run {
        SyncMode::DryRun
    } else {
        SyncMode::Live
    };

    let provider = GoogleSessionProvider::new(config.google_account.clone());

    let heading = match mode {
        SyncMode::DryRun => "DRY RUN - would create the following events:".to_string(),
        SyncMode::Live => format!("📅 {}", config.calendar_id),
    };

    // The consent flow prints to the terminal, so only spin when a session is stored
    let spinner = (mode == SyncMode::Live && !provider.needs_consent()?)
        .then(|| tui::create_spinner(heading.clone()));

    let synchronizer = Synchronizer::new(provider, EventTemplate::from_config(config));
    let result = synchronizer
        .synchronize(&schedule.games, options.resume_after.as_deref(), mode)
        .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    println!("{}", heading);

    let report = match result {
        Ok(report) => report,
        Err(abort) => {
            println!("{}", render_report(&abort.report));
            println!(
                "   {} {}",
                "!".red(),
                format!("Last error occurred with opponent: {}", abort.opponent).red()
            );
            return Err(abort.into());
        }
    };

    println!("{}", render_report(&report));

    if let Some(resume_after) = &options.resume_after {
        if mode == SyncMode::Live && !report.resume_point_found {
            println!(
                "\n{}",
                format!("No game against '{}' found, nothing was synced", resume_after).yellow()
            );
        }
    }

    if mode == SyncMode::Live {
        let (created, duplicates, _) = report.counts();
        println!(
            "\nCreated {} {}, skipped {} existing",
            created,
            pluralize("event", created),
            duplicates
        );
    }

    Ok(())
}
