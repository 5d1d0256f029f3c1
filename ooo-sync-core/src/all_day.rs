//! Conversion of an inclusive UTC time-off period into an all-day window.
//!
//! Clockify periods include their last day; all-day calendar events end on
//! an exclusive date. The window therefore ends on the day after the local
//! date of the period's end.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllDayWindow {
    pub start_date: NaiveDate,
    pub end_date_exclusive: NaiveDate,
    zone: Tz,
}

impl AllDayWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> Self {
        let start_date = start.with_timezone(&zone).date_naive();
        let end_date = end.with_timezone(&zone).date_naive();

        AllDayWindow {
            start_date,
            end_date_exclusive: end_date.succ_opt().unwrap_or(NaiveDate::MAX),
            zone,
        }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Local midnight at the start date.
    pub fn time_min(&self) -> DateTime<Utc> {
        local_midnight(self.zone, self.start_date)
    }

    /// Local midnight at the exclusive end date.
    pub fn time_max(&self) -> DateTime<Utc> {
        local_midnight(self.zone, self.end_date_exclusive)
    }
}

/// An empty or blank zone name means UTC.
pub fn resolve_zone(name: &str) -> Result<Tz, SyncError> {
    if name.trim().is_empty() {
        return Ok(Tz::UTC);
    }

    name.parse::<Tz>().map_err(|_| SyncError::UnknownTimeZone {
        zone: name.to_string(),
    })
}

pub fn to_all_day_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    zone_name: &str,
) -> Result<AllDayWindow, SyncError> {
    let zone = resolve_zone(zone_name)?;
    Ok(AllDayWindow::new(start, end, zone))
}

/// First instant of `date` in `zone`. When a DST jump skips midnight the day
/// starts at the end of the gap.
fn local_midnight(zone: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::default());

    if let Some(start) = zone.from_local_datetime(&midnight).earliest() {
        return start.with_timezone(&Utc);
    }

    let offset_before = zone
        .offset_from_utc_datetime(&(midnight - Duration::days(1)))
        .fix()
        .local_minus_utc();

    (midnight - Duration::seconds(i64::from(offset_before))).and_utc()
}
