//! Time-off requests as returned by the Clockify API.

use serde::{Deserialize, Serialize};

/// One absence record. Timestamps are kept as the strings Clockify sent;
/// they are parsed where they are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequest {
    /// Unique per workspace; embedded in calendar events as the correlation key
    pub id: String,
    pub created_at: String,
    #[serde(default)]
    pub policy_name: Option<String>,
    pub user_email: String,
    pub user_time_zone: String,
    pub time_off_period: TimeOffPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeOffPeriod {
    pub period: Period,
}

/// Both ends are inclusive: `end` is the last moment of the absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

impl TimeOffRequest {
    /// Policy label, ignoring empty strings.
    pub fn policy(&self) -> Option<&str> {
        self.policy_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn period_start(&self) -> &str {
        &self.time_off_period.period.start
    }

    pub fn period_end(&self) -> &str {
        &self.time_off_period.period.end
    }
}
