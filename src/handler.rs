//! AWS Lambda entry point. The event carries the same parameters as the
//! `sync` subcommand and always targets the primary calendar.

use lambda_runtime::{LambdaEvent, service_fn};
use ooo_sync_core::SyncReport;
use ooo_sync_core::sync::DEFAULT_CALENDAR_ID;
use serde::Serialize;

use crate::commands;
use crate::config::Settings;
use crate::params::RunParams;

/// Handler response.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Summary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl From<&SyncReport> for Summary {
    fn from(report: &SyncReport) -> Self {
        let (inserted, skipped, failed) = report.counts();

        Summary {
            inserted,
            skipped,
            failed,
            errors: report.errors().map(ToString::to_string).collect(),
        }
    }
}

pub async fn run() -> Result<(), lambda_runtime::Error> {
    lambda_runtime::run(service_fn(handle)).await
}

async fn handle(event: LambdaEvent<Option<RunParams>>) -> Result<Summary, lambda_runtime::Error> {
    let params = event.payload.unwrap_or_default();
    let run = params.validate()?;
    let settings = Settings::load()?;

    tracing::info!(by = %run.by, page_size = run.query.page_size, "sync invoked");

    let report =
        commands::sync::sync(&settings, &run, vec![DEFAULT_CALENDAR_ID.to_string()], None).await?;

    let summary = report.as_ref().map(Summary::from).unwrap_or_default();
    tracing::info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        failed = summary.failed,
        "sync finished"
    );

    Ok(summary)
}
