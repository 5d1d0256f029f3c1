use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use ooo_sync_core::filter::filter_by_created_at;
use ooo_sync_core::{SyncReport, Synchronizer, TimeOffRequest};

use crate::commands::{fetch_raw, google_provider};
use crate::config::Settings;
use crate::params::ValidatedRun;
use crate::render::Render;

pub async fn run(
    settings: &Settings,
    run: ValidatedRun,
    calendars: Vec<String>,
    input: Option<&Path>,
) -> Result<()> {
    let Some(report) = sync(settings, &run, calendars, input).await? else {
        println!("No requests to process.");
        return Ok(());
    };

    for outcome in report.outcomes() {
        println!("{}", outcome.render());
    }
    println!("\n{}", report.render());

    Ok(())
}

/// Fetch (or read), filter and sync. None when no request survives the filter.
///
/// Credentials are checked before anything is fetched.
pub async fn sync(
    settings: &Settings,
    run: &ValidatedRun,
    calendars: Vec<String>,
    input: Option<&Path>,
) -> Result<Option<SyncReport>> {
    let provider = google_provider(settings)?;

    let requests = load_requests(settings, run, input).await?;
    if requests.is_empty() {
        return Ok(None);
    }

    tracing::info!(count = requests.len(), "syncing time-off requests");
    if !run.filters_by_created() {
        tracing::warn!(by = %run.by, "no created-at bound: syncing every fetched request");
    }

    let synchronizer = Synchronizer::new(provider).with_calendars(calendars);
    Ok(Some(synchronizer.sync(&requests).await))
}

async fn load_requests(
    settings: &Settings,
    run: &ValidatedRun,
    input: Option<&Path>,
) -> Result<Vec<TimeOffRequest>> {
    let raw = match input {
        Some(path) => read_input(path)?,
        None => fetch_raw(settings, run).await?,
    };

    filter_by_created_at(&raw, &run.created_range()).context("filter")
}

/// A saved API response, from a file or `-` for stdin.
fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read stdin")?;
        return Ok(bytes);
    }

    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}
