use anyhow::{Context, Result};
use ooo_sync_core::clockify::pretty_json;
use ooo_sync_core::filter::select_by_created_at;

use crate::commands::fetch_raw;
use crate::config::Settings;
use crate::params::ValidatedRun;

pub async fn run(settings: &Settings, run: ValidatedRun) -> Result<()> {
    let raw = fetch_raw(settings, &run).await?;

    if !run.filters_by_created() {
        // Non-JSON bodies are printed as received
        match pretty_json(&raw) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", String::from_utf8_lossy(&raw)),
        }
        return Ok(());
    }

    let envelope = select_by_created_at(&raw, &run.created).context("filter")?;
    let bytes = serde_json::to_vec(&envelope)?;
    println!("{}", pretty_json(&bytes)?);

    Ok(())
}
