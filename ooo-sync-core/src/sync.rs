//! Idempotent insertion of all-day OOO events.
//!
//! Each request goes through: resolve zone -> parse period -> compute window
//! -> impersonate user -> per calendar: look up correlated event -> insert if
//! absent. A failure ends that request (or that calendar) only; it is recorded
//! in the [`SyncReport`] and the batch moves on.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::all_day::{AllDayWindow, resolve_zone};
use crate::calendar::{CalendarProvider, CalendarService, EventFilter, NewEvent};
use crate::error::{PeriodField, SyncError};
use crate::time::parse_instant;
use crate::time_off::TimeOffRequest;

/// Private extended property holding the Clockify request id.
pub const CORRELATION_KEY: &str = "clockifyRequestId";

/// Google's alias for the user's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";

const SUMMARY: &str = "[TEST] OOO";

#[derive(Debug)]
pub enum SyncOutcome {
    Inserted {
        event_id: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    /// `matches` > 1 means duplicates exist; they are reported, not resolved.
    SkippedExisting { event_id: String, matches: usize },
    Failed(SyncError),
}

#[derive(Debug)]
pub struct RequestOutcome {
    pub request_id: String,
    pub user_email: String,
    /// None when the request failed before any calendar was touched
    pub calendar_id: Option<String>,
    pub outcome: SyncOutcome,
}

impl RequestOutcome {
    pub fn error(&self) -> Option<&SyncError> {
        match &self.outcome {
            SyncOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cal = self.calendar_id.as_deref().unwrap_or("-");

        match &self.outcome {
            SyncOutcome::Inserted {
                start_date,
                end_date,
                ..
            } => write!(
                f,
                "Inserted OOO for req={} user={} cal={} ({} → {})",
                self.request_id, self.user_email, cal, start_date, end_date
            ),
            SyncOutcome::SkippedExisting { event_id, matches } => {
                write!(
                    f,
                    "Found existing OOO event for req={} user={} cal={} eventId={}",
                    self.request_id, self.user_email, cal, event_id
                )?;
                if *matches > 1 {
                    write!(f, " ({} matching events)", matches)?;
                }
                Ok(())
            }
            SyncOutcome::Failed(e) => write!(
                f,
                "Failed req={} user={} cal={}: {}",
                self.request_id, self.user_email, cal, e
            ),
        }
    }
}

/// Every outcome of one batch, in processing order.
#[derive(Debug, Default)]
pub struct SyncReport(pub Vec<RequestOutcome>);

impl SyncReport {
    fn record(&mut self, request: &TimeOffRequest, calendar_id: Option<&str>, outcome: SyncOutcome) {
        let entry = RequestOutcome {
            request_id: request.id.clone(),
            user_email: request.user_email.clone(),
            calendar_id: calendar_id.map(str::to_string),
            outcome,
        };

        match &entry.outcome {
            SyncOutcome::Failed(e) => tracing::warn!(
                request_id = %entry.request_id,
                user = %entry.user_email,
                calendar = ?entry.calendar_id,
                kind = e.kind(),
                error = %e,
                "request failed"
            ),
            _ => tracing::info!(
                request_id = %entry.request_id,
                user = %entry.user_email,
                calendar = ?entry.calendar_id,
                "{}",
                entry
            ),
        }

        self.0.push(entry);
    }

    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.0
    }

    /// (inserted, skipped, failed)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut inserted = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for entry in &self.0 {
            match entry.outcome {
                SyncOutcome::Inserted { .. } => inserted += 1,
                SyncOutcome::SkippedExisting { .. } => skipped += 1,
                SyncOutcome::Failed(_) => failed += 1,
            }
        }

        (inserted, skipped, failed)
    }

    pub fn errors(&self) -> impl Iterator<Item = &RequestOutcome> {
        self.0.iter().filter(|entry| entry.error().is_some())
    }

    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }
}

pub struct Synchronizer<P> {
    provider: P,
    calendar_ids: Vec<String>,
}

impl<P: CalendarProvider> Synchronizer<P> {
    pub fn new(provider: P) -> Self {
        Synchronizer {
            provider,
            calendar_ids: vec![DEFAULT_CALENDAR_ID.to_string()],
        }
    }

    /// Target calendars for every request. An empty list keeps the default.
    pub fn with_calendars(mut self, calendar_ids: Vec<String>) -> Self {
        if !calendar_ids.is_empty() {
            self.calendar_ids = calendar_ids;
        }
        self
    }

    pub fn calendar_ids(&self) -> &[String] {
        &self.calendar_ids
    }

    /// Process requests one after another. Never fails as a whole.
    pub async fn sync(&self, requests: &[TimeOffRequest]) -> SyncReport {
        let mut report = SyncReport::default();

        for request in requests {
            self.sync_request(request, &mut report).await;
        }

        report
    }

    async fn sync_request(&self, request: &TimeOffRequest, report: &mut SyncReport) {
        let window = match prepare_window(request) {
            Ok(window) => window,
            Err(e) => {
                report.record(request, None, SyncOutcome::Failed(e));
                return;
            }
        };

        let calendar = match self.provider.impersonate(&request.user_email).await {
            Ok(calendar) => calendar,
            Err(e) => {
                report.record(request, None, SyncOutcome::Failed(SyncError::Impersonation(e)));
                return;
            }
        };

        let event = build_event(request, &window);

        for calendar_id in &self.calendar_ids {
            let outcome = sync_to_calendar(&calendar, calendar_id, request, &window, &event).await;
            report.record(request, Some(calendar_id), outcome);
        }
    }
}

/// Zone first, then both ends of the period.
fn prepare_window(request: &TimeOffRequest) -> Result<AllDayWindow, SyncError> {
    let zone = resolve_zone(&request.user_time_zone)?;

    let start = parse_instant(request.period_start()).map_err(|source| SyncError::InvalidPeriod {
        field: PeriodField::Start,
        source,
    })?;
    let end = parse_instant(request.period_end()).map_err(|source| SyncError::InvalidPeriod {
        field: PeriodField::End,
        source,
    })?;

    Ok(AllDayWindow::new(start, end, zone))
}

async fn sync_to_calendar<C: CalendarService>(
    calendar: &C,
    calendar_id: &str,
    request: &TimeOffRequest,
    window: &AllDayWindow,
    event: &NewEvent,
) -> SyncOutcome {
    let filter = EventFilter {
        private_property: (CORRELATION_KEY.to_string(), request.id.clone()),
        time_min: window.time_min(),
        time_max: window.time_max(),
    };

    let existing = match calendar.list_events(calendar_id, &filter).await {
        Ok(events) => events,
        Err(e) => return SyncOutcome::Failed(SyncError::Lookup(e)),
    };

    if let Some(first) = existing.first() {
        if existing.len() > 1 {
            tracing::warn!(
                request_id = %request.id,
                calendar = calendar_id,
                matches = existing.len(),
                "several events carry the same request id"
            );
        }
        return SyncOutcome::SkippedExisting {
            event_id: first.id.clone(),
            matches: existing.len(),
        };
    }

    match calendar.insert_event(calendar_id, event).await {
        Ok(created) => SyncOutcome::Inserted {
            event_id: created.id,
            start_date: window.start_date,
            end_date: window.end_date_exclusive,
        },
        Err(e) => SyncOutcome::Failed(SyncError::Insert(e)),
    }
}

/// The event inserted for `request`, tagged with its correlation key.
pub fn build_event(request: &TimeOffRequest, window: &AllDayWindow) -> NewEvent {
    let summary = match request.policy() {
        Some(policy) => format!("{} — {}", SUMMARY, policy),
        None => SUMMARY.to_string(),
    };

    NewEvent {
        summary,
        description: format!(
            "Clockify request: {}\nCreatedAt: {}",
            request.id, request.created_at
        ),
        start_date: window.start_date,
        end_date: window.end_date_exclusive,
        private_properties: BTreeMap::from([(CORRELATION_KEY.to_string(), request.id.clone())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarEvent;
    use crate::error::CalendarError;
    use crate::time_off::{Period, TimeOffPeriod};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Calendar double that remembers inserted events across runs.
    #[derive(Clone, Default)]
    struct FakeCalendars {
        events: Arc<Mutex<Vec<(String, String, CalendarEvent)>>>,
        refuse_user: Option<String>,
        fail_lookup: bool,
        fail_insert: bool,
    }

    struct FakeHandle {
        user: String,
        store: FakeCalendars,
    }

    #[async_trait]
    impl CalendarProvider for FakeCalendars {
        type Calendar = FakeHandle;

        async fn impersonate(&self, user_email: &str) -> Result<FakeHandle, CalendarError> {
            if self.refuse_user.as_deref() == Some(user_email) {
                return Err(CalendarError::Auth("unauthorized_client".to_string()));
            }
            Ok(FakeHandle {
                user: user_email.to_string(),
                store: self.clone(),
            })
        }
    }

    #[async_trait]
    impl CalendarService for FakeHandle {
        async fn list_events(
            &self,
            calendar_id: &str,
            filter: &EventFilter,
        ) -> Result<Vec<CalendarEvent>, CalendarError> {
            if self.store.fail_lookup {
                return Err(CalendarError::Api {
                    status: 503,
                    message: "backend error".to_string(),
                });
            }
            let (key, value) = &filter.private_property;
            let events = self.store.events.lock().unwrap();
            Ok(events
                .iter()
                .filter(|(user, cal, event)| {
                    user == &self.user
                        && cal == calendar_id
                        && event.private_properties.get(key) == Some(value)
                })
                .map(|(_, _, event)| event.clone())
                .collect())
        }

        async fn insert_event(
            &self,
            calendar_id: &str,
            event: &NewEvent,
        ) -> Result<CalendarEvent, CalendarError> {
            if self.store.fail_insert {
                return Err(CalendarError::Api {
                    status: 403,
                    message: "forbidden".to_string(),
                });
            }
            let mut events = self.store.events.lock().unwrap();
            let created = CalendarEvent {
                id: format!("evt-{}", events.len() + 1),
                summary: event.summary.clone(),
                start_date: Some(event.start_date),
                end_date: Some(event.end_date),
                private_properties: event.private_properties.clone(),
            };
            events.push((self.user.clone(), calendar_id.to_string(), created.clone()));
            Ok(created)
        }
    }

    fn request(id: &str, tz: &str, start: &str, end: &str) -> TimeOffRequest {
        TimeOffRequest {
            id: id.to_string(),
            created_at: "2025-12-01T12:00:00Z".to_string(),
            policy_name: Some("Vacation".to_string()),
            user_email: "fixture@example.com".to_string(),
            user_time_zone: tz.to_string(),
            time_off_period: TimeOffPeriod {
                period: Period {
                    start: start.to_string(),
                    end: end.to_string(),
                },
            },
        }
    }

    fn valid(id: &str) -> TimeOffRequest {
        request(id, "America/New_York", "2025-12-10T00:00:00Z", "2025-12-10T23:59:59Z")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn second_run_skips_existing_event() {
        let calendars = FakeCalendars::default();
        let sync = Synchronizer::new(calendars.clone());
        let requests = vec![valid("req-1")];

        let first = sync.sync(&requests).await;
        assert_eq!(first.counts(), (1, 0, 0));

        let second = sync.sync(&requests).await;
        assert_eq!(second.counts(), (0, 1, 0));
        assert!(matches!(
            &second.outcomes()[0].outcome,
            SyncOutcome::SkippedExisting { event_id, matches: 1 } if event_id == "evt-1"
        ));
        assert_eq!(calendars.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_bad_request_does_not_stop_the_batch() {
        let sync = Synchronizer::new(FakeCalendars::default());
        let requests = vec![
            valid("req-1"),
            request("req-2", "Not/A_Timezone", "2025-12-10T00:00:00Z", "2025-12-10T23:59:59Z"),
            valid("req-3"),
        ];

        let report = sync.sync(&requests).await;
        let outcomes = report.outcomes();

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0].outcome, SyncOutcome::Inserted { .. }));
        assert!(matches!(
            outcomes[1].outcome,
            SyncOutcome::Failed(SyncError::UnknownTimeZone { .. })
        ));
        assert_eq!(outcomes[1].calendar_id, None);
        assert!(matches!(outcomes[2].outcome, SyncOutcome::Inserted { .. }));
        assert_eq!(report.errors().count(), 1);
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn every_invalid_request_is_collected() {
        let calendars = FakeCalendars::default();
        let sync = Synchronizer::new(calendars.clone());
        let requests = vec![
            request("bad-tz", "Not/A_Timezone", "not-a-date", "2025-12-10T23:59:59Z"),
            request("bad-start", "America/New_York", "not-a-date", "2025-12-10T23:59:59Z"),
            request("bad-end", "America/New_York", "2025-12-10T00:00:00Z", "not-a-date"),
        ];

        let report = sync.sync(&requests).await;
        let errors: Vec<&SyncError> = report.errors().filter_map(|o| o.error()).collect();

        assert_eq!(errors.len(), 3);
        // zone is checked before the period
        assert!(matches!(errors[0], SyncError::UnknownTimeZone { .. }));
        assert!(matches!(
            errors[1],
            SyncError::InvalidPeriod { field: PeriodField::Start, .. }
        ));
        assert!(matches!(
            errors[2],
            SyncError::InvalidPeriod { field: PeriodField::End, .. }
        ));
        assert!(calendars.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inserted_event_carries_correlation_key_and_dates() {
        let calendars = FakeCalendars::default();
        let sync = Synchronizer::new(calendars.clone());

        let report = sync.sync(&[valid("req-9")]).await;
        assert!(matches!(
            report.outcomes()[0].outcome,
            SyncOutcome::Inserted { start_date, end_date, .. }
                if start_date == date(2025, 12, 9) && end_date == date(2025, 12, 11)
        ));

        let events = calendars.events.lock().unwrap();
        let (user, cal, event) = &events[0];
        assert_eq!(user, "fixture@example.com");
        assert_eq!(cal, "primary");
        assert_eq!(event.summary, "[TEST] OOO — Vacation");
        assert_eq!(
            event.private_properties.get(CORRELATION_KEY).map(String::as_str),
            Some("req-9")
        );
    }

    #[test]
    fn event_text_without_policy() {
        let mut req = valid("req-5");
        req.policy_name = Some(String::new());
        let window = prepare_window(&req).unwrap();

        let event = build_event(&req, &window);
        assert_eq!(event.summary, "[TEST] OOO");
        assert_eq!(
            event.description,
            "Clockify request: req-5\nCreatedAt: 2025-12-01T12:00:00Z"
        );
        assert_eq!(event.start_date, date(2025, 12, 9));
        assert_eq!(event.end_date, date(2025, 12, 11));
    }

    #[tokio::test]
    async fn each_calendar_gets_its_own_outcome() {
        let calendars = FakeCalendars::default();
        let sync = Synchronizer::new(calendars.clone())
            .with_calendars(vec!["primary".to_string(), "team@example.com".to_string()]);

        let report = sync.sync(&[valid("req-1")]).await;
        let cals: Vec<Option<&str>> = report
            .outcomes()
            .iter()
            .map(|o| o.calendar_id.as_deref())
            .collect();

        assert_eq!(cals, vec![Some("primary"), Some("team@example.com")]);
        assert_eq!(report.counts(), (2, 0, 0));
    }

    #[tokio::test]
    async fn duplicates_are_reported_not_resolved() {
        let calendars = FakeCalendars::default();
        let sync = Synchronizer::new(calendars.clone());
        let req = valid("req-1");
        let window = prepare_window(&req).unwrap();
        let handle = calendars.impersonate(&req.user_email).await.unwrap();
        let event = build_event(&req, &window);
        handle.insert_event("primary", &event).await.unwrap();
        handle.insert_event("primary", &event).await.unwrap();

        let report = sync.sync(&[req]).await;
        assert!(matches!(
            report.outcomes()[0].outcome,
            SyncOutcome::SkippedExisting { matches: 2, .. }
        ));
        assert_eq!(calendars.events.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn calendar_failures_are_recorded_per_request() {
        let lookup = Synchronizer::new(FakeCalendars {
            fail_lookup: true,
            ..Default::default()
        });
        let report = lookup.sync(&[valid("req-1")]).await;
        assert!(matches!(
            report.outcomes()[0].outcome,
            SyncOutcome::Failed(SyncError::Lookup(_))
        ));

        let insert = Synchronizer::new(FakeCalendars {
            fail_insert: true,
            ..Default::default()
        });
        let report = insert.sync(&[valid("req-1"), valid("req-2")]).await;
        assert_eq!(report.counts(), (0, 0, 2));
        assert!(report.outcomes()[0].to_string().contains("insert failed"));

        let refused = Synchronizer::new(FakeCalendars {
            refuse_user: Some("fixture@example.com".to_string()),
            ..Default::default()
        });
        let report = refused.sync(&[valid("req-1")]).await;
        assert!(matches!(
            report.outcomes()[0].outcome,
            SyncOutcome::Failed(SyncError::Impersonation(_))
        ));
    }
}
