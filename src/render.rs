//! Colored terminal rendering for sync results.

use ooo_sync_core::{RequestOutcome, SyncOutcome, SyncReport};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for RequestOutcome {
    fn render(&self) -> String {
        let line = self.to_string();
        match self.outcome {
            SyncOutcome::Inserted { .. } => format!("{} {}", "+".green(), line.green()),
            SyncOutcome::SkippedExisting { matches, .. } if matches > 1 => {
                format!("{} {}", "=".yellow(), line.yellow())
            }
            SyncOutcome::SkippedExisting { .. } => format!("{} {}", "=".dimmed(), line.dimmed()),
            SyncOutcome::Failed(_) => format!("{} {}", "!".red(), line.red()),
        }
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let (inserted, skipped, failed) = self.counts();
        let summary = format!(
            "Sync complete: {} inserted, {} skipped, {} {}",
            inserted,
            skipped,
            failed,
            pluralize("error", failed)
        );

        if failed > 0 {
            summary.red().to_string()
        } else {
            summary.green().to_string()
        }
    }
}
