//! Calendar v3 JSON shapes, limited to the fields ooo-sync reads or writes.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use ooo_sync_core::{CalendarEvent, NewEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleEvent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

/// Either `date` (all-day) or `dateTime` is set.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
}

impl EventDateTime {
    fn local_date(&self) -> Option<NaiveDate> {
        self.date.or_else(|| self.date_time.map(|dt| dt.date_naive()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ExtendedProperties {
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

impl From<&NewEvent> for GoogleEvent {
    fn from(event: &NewEvent) -> Self {
        GoogleEvent {
            summary: event.summary.clone(),
            description: Some(event.description.clone()),
            start: Some(EventDateTime {
                date: Some(event.start_date),
                date_time: None,
            }),
            end: Some(EventDateTime {
                date: Some(event.end_date),
                date_time: None,
            }),
            extended_properties: Some(ExtendedProperties {
                private: event.private_properties.clone(),
            }),
            ..Default::default()
        }
    }
}

impl From<GoogleEvent> for CalendarEvent {
    fn from(event: GoogleEvent) -> Self {
        CalendarEvent {
            start_date: event.start.as_ref().and_then(EventDateTime::local_date),
            end_date: event.end.as_ref().and_then(EventDateTime::local_date),
            private_properties: event
                .extended_properties
                .map(|props| props.private)
                .unwrap_or_default(),
            id: event.id,
            summary: event.summary,
        }
    }
}
