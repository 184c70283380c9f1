mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gamecal_core::config::GameCalConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gamecal")]
#[command(about = "Add the upcoming games from a team's schedule page to your calendar")]
struct Cli {
    /// Config file (defaults to ~/.config/gamecal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Google Calendar
    Auth,
    /// Write a commented default config file
    Init,
    /// Show the upcoming games found in a schedule page
    Parse {
        /// Saved HTML of the schedule page
        file: PathBuf,

        /// Stop after this many upcoming games
        #[arg(short = 'n', long)]
        max_games: Option<usize>,

        /// Print games as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create calendar events for the upcoming games in a schedule page
    Sync {
        /// Saved HTML of the schedule page
        file: PathBuf,

        /// Print the events that would be created without touching the calendar
        #[arg(long)]
        dry_run: bool,

        /// Skip every game before the one against this opponent
        #[arg(short, long, value_name = "OPPONENT")]
        resume_after: Option<String>,

        /// Stop after this many upcoming games
        #[arg(short = 'n', long)]
        max_games: Option<usize>,

        /// Also list the schedule entries that were skipped
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => GameCalConfig::config_path()?,
    };

    match cli.command {
        Commands::Auth => commands::auth::run(&config_path).await,
        Commands::Init => commands::init::run(&config_path),
        Commands::Parse {
            file,
            max_games,
            json,
        } => {
            let config = GameCalConfig::load_from(&config_path)?;
            commands::parse::run(&config, &file, max_games, json)
        }
        Commands::Sync {
            file,
            dry_run,
            resume_after,
            max_games,
            verbose,
        } => {
            let config = GameCalConfig::load_from(&config_path)?;
            let options = commands::sync::SyncOptions {
                dry_run,
                resume_after,
                max_games,
                verbose,
            };
            commands::sync::run(&config, &file, options).await
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,gamecal_core=info,gamecal_provider_google=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
