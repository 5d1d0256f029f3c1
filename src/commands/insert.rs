use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use ooo_sync_core::{CalendarProvider, CalendarService, NewEvent};
use owo_colors::OwoColorize;

use crate::commands::google_provider;
use crate::config::Settings;

/// Insert one all-day test event, `start` through `end` inclusive, into each
/// calendar of `user`. Failures are reported per calendar.
pub async fn run(
    settings: &Settings,
    user: &str,
    start: NaiveDate,
    end: NaiveDate,
    calendars: Vec<String>,
) -> Result<()> {
    let event = test_event(start, end)?;
    let provider = google_provider(settings)?;
    let calendar = provider.impersonate(user).await?;

    for calendar_id in &calendars {
        match calendar.insert_event(calendar_id, &event).await {
            Ok(created) => println!(
                "{} Inserted OOO event into {} (eventId={})",
                "+".green(),
                calendar_id,
                created.id
            ),
            Err(e) => println!(
                "{} Failed to insert into {}: {}",
                "!".red(),
                calendar_id,
                e.to_string().red()
            ),
        }
    }

    Ok(())
}

fn test_event(start: NaiveDate, end: NaiveDate) -> Result<NewEvent> {
    if end < start {
        anyhow::bail!("--end {} is before --start {}", end, start);
    }

    let Some(end_exclusive) = end.succ_opt() else {
        anyhow::bail!("--end {} is out of range", end);
    };

    Ok(NewEvent {
        summary: "[TEST] OOO".to_string(),
        description: "OOO test event inserted via service account".to_string(),
        start_date: start,
        end_date: end_exclusive,
        private_properties: BTreeMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_ends_next_day() {
        let event = test_event(date(2025, 11, 26), date(2025, 11, 26)).unwrap();
        assert_eq!(event.start_date, date(2025, 11, 26));
        assert_eq!(event.end_date, date(2025, 11, 27));
        assert!(event.private_properties.is_empty());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = test_event(date(2025, 11, 26), date(2025, 11, 25)).unwrap_err();
        assert!(err.to_string().contains("before --start"));
    }
}
