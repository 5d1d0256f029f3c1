mod commands;
mod config;
mod handler;
mod params;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ooo_sync_core::sync::DEFAULT_CALENDAR_ID;
use params::{FilterBy, QueryArgs};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "ooo-sync")]
#[command(about = "Sync Clockify time-off requests into Google Calendar as all-day OOO events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print time-off requests from Clockify as JSON (--by defaults to period)
    Fetch {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Insert an all-day OOO event for each time-off request (--by defaults to created)
    Sync {
        #[command(flatten)]
        query: QueryArgs,

        /// Target calendar, repeatable
        #[arg(long = "calendar", default_value = DEFAULT_CALENDAR_ID)]
        calendars: Vec<String>,

        /// Sync a saved API response instead of fetching ("-" for stdin)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Insert a single all-day OOO test event for one user
    Insert {
        /// User to impersonate
        #[arg(long)]
        user: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Target calendar, repeatable
        #[arg(long = "calendar", default_value = DEFAULT_CALENDAR_ID)]
        calendars: Vec<String>,
    },
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    if std::env::var_os("AWS_LAMBDA_RUNTIME_API").is_some() {
        init_lambda_logging();
        return runtime
            .block_on(handler::run())
            .map_err(|e| anyhow::anyhow!(e));
    }

    runtime.block_on(run_cli())
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let found_dotenv = crate::config::load_dotenv();
    init_cli_logging();
    if !found_dotenv {
        tracing::warn!("no .env file found, relying on environment vars");
    }

    let settings = Settings::load()?;

    match cli.command {
        Commands::Fetch { query } => {
            let run = query.into_params(FilterBy::Period).validate()?;
            commands::fetch::run(&settings, run).await
        }
        Commands::Sync {
            query,
            calendars,
            input,
        } => {
            let run = query.into_params(FilterBy::Created).validate()?;
            commands::sync::run(&settings, run, calendars, input.as_deref()).await
        }
        Commands::Insert {
            user,
            start,
            end,
            calendars,
        } => commands::insert::run(&settings, &user, start, end, calendars).await,
    }
}

/// Human output goes to stdout; logs go to stderr.
fn init_cli_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_lambda_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .without_time()
        .init();
}
