use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use punch_cli::commands::{clear_week, day, edit, session, status, summary, util, watch, week};
use punch_cli::{Cli, Commands, Config};
use punch_core::clock::SystemClock;
use punch_core::session::Action;
use punch_core::tracker::Tracker;
use punch_db::Database;

type CliTracker = Tracker<Database, Arc<SystemClock>>;

/// Load config and open today's session, ensuring the database directory exists.
fn open_tracker(config_path: Option<&Path>) -> Result<(CliTracker, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let tracker =
        Tracker::load(db, Arc::new(SystemClock)).context("failed to load today's session")?;
    Ok((tracker, config))
}

/// Resolves an optional date argument, defaulting to today.
fn date_arg(arg: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    arg.map_or(Ok(today), |s| util::parse_date(s, today))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut tracker, config) = open_tracker(cli.config.as_deref())?;
    let format = config.clock_format;
    let mut stdout = io::stdout().lock();
    let today = tracker.today();

    match command {
        Commands::Start => session::run(&mut stdout, &mut tracker, Action::Start, format)?,
        Commands::Pause => session::run(&mut stdout, &mut tracker, Action::Pause, format)?,
        Commands::Resume => session::run(&mut stdout, &mut tracker, Action::Resume, format)?,
        Commands::Stop => session::run(&mut stdout, &mut tracker, Action::Stop, format)?,
        Commands::Status => status::run(&mut stdout, &tracker, format)?,
        Commands::Watch => watch::run(&mut stdout, &mut tracker)?,
        Commands::Day { date, json } => {
            let date = date_arg(date.as_deref(), today)?;
            day::run(&mut stdout, &tracker, date, *json, format)?;
        }
        Commands::Week { week: of, json } => {
            let date = date_arg(of.as_deref(), today)?;
            week::run(&mut stdout, &tracker, date, *json)?;
        }
        Commands::Summary { json } => summary::run(&mut stdout, &tracker, *json)?,
        Commands::Edit {
            field,
            value,
            index,
            date,
        } => {
            let date = date_arg(date.as_deref(), today)?;
            let target = edit::edit_target(*field, *index)?;
            edit::run(&mut stdout, &mut tracker, date, target, value, format)?;
        }
        Commands::ClearWeek { week: of, yes } => {
            let date = date_arg(of.as_deref(), today)?;
            clear_week::run(&mut stdout, &mut tracker, date, *yes)?;
        }
    }

    Ok(())
}
