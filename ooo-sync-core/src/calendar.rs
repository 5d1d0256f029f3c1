//! What the synchronizer needs from a calendar service.
//!
//! Providers hand out a per-user handle through [`CalendarProvider::impersonate`];
//! the synchronizer calls it once per request, so it must be cheap to repeat.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// An all-day event to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start_date: NaiveDate,
    /// Exclusive
    pub end_date: NaiveDate,
    /// Stored as private extended properties, visible only to this app
    pub private_properties: BTreeMap<String, String>,
}

/// An event as stored by the calendar service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub private_properties: BTreeMap<String, String>,
}

/// Events carrying `private_property` and overlapping `[time_min, time_max)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub private_property: (String, String),
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn list_events(
        &self,
        calendar_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &NewEvent,
    ) -> Result<CalendarEvent, CalendarError>;
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    type Calendar: CalendarService;

    /// A handle acting as `user_email`.
    async fn impersonate(&self, user_email: &str) -> Result<Self::Calendar, CalendarError>;
}
