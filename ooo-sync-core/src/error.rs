//! Error types for ooo-sync.

use std::fmt;

use thiserror::Error;

use crate::time::TimeParseError;

/// Problems found before any request is processed. Always fatal.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("missing env {0}")]
    MissingEnv(&'static str),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("invalid calendar credential: {0}")]
    Credential(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors fetching or decoding the time-off source response. Fatal for the run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("non-2xx status: {status}\n{body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("decode: {0}")]
    Envelope(#[source] serde_json::Error),
}

/// Errors reported by a calendar provider.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("calendar request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("calendar API returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Which end of a time-off period failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodField {
    Start,
    End,
}

impl fmt::Display for PeriodField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodField::Start => write!(f, "period.start"),
            PeriodField::End => write!(f, "period.end"),
        }
    }
}

/// Failure of a single request. Recorded in the report, never propagated.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("unknown time zone {zone:?}")]
    UnknownTimeZone { zone: String },

    #[error("bad {field}: {source}")]
    InvalidPeriod {
        field: PeriodField,
        #[source]
        source: TimeParseError,
    },

    #[error("calendar service error: {0}")]
    Impersonation(#[source] CalendarError),

    #[error("lookup failed: {0}")]
    Lookup(#[source] CalendarError),

    #[error("insert failed: {0}")]
    Insert(#[source] CalendarError),
}

impl SyncError {
    /// Stable label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::UnknownTimeZone { .. } => "unknown_time_zone",
            SyncError::InvalidPeriod { .. } => "invalid_period",
            SyncError::Impersonation(_) => "impersonation",
            SyncError::Lookup(_) => "lookup",
            SyncError::Insert(_) => "insert",
        }
    }
}
