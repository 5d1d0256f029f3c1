//! HTTP client for the Clockify time-off API.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::FetchError;

pub const DEFAULT_BASE_URL: &str = "https://api.clockify.me/api/v1";

/// Bound on the whole call, including reading the body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeOffStatus {
    Pending,
    Approved,
    Rejected,
    All,
}

impl FromStr for TimeOffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        match normalized.as_str() {
            "PENDING" => Ok(TimeOffStatus::Pending),
            "APPROVED" => Ok(TimeOffStatus::Approved),
            "REJECTED" => Ok(TimeOffStatus::Rejected),
            "ALL" => Ok(TimeOffStatus::All),
            _ => Err(format!(
                "invalid statuses value: {:?} (must be one of PENDING, APPROVED, REJECTED, ALL)",
                normalized
            )),
        }
    }
}

impl fmt::Display for TimeOffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOffStatus::Pending => write!(f, "PENDING"),
            TimeOffStatus::Approved => write!(f, "APPROVED"),
            TimeOffStatus::Rejected => write!(f, "REJECTED"),
            TimeOffStatus::All => write!(f, "ALL"),
        }
    }
}

/// Body of `POST /workspaces/{id}/time-off/requests`.
///
/// `start` and `end` must already be in the format produced by
/// [`crate::time::format_for_source_api`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<TimeOffStatus>,
    /// Restricts results to these user ids
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
}

impl Default for TimeOffQuery {
    fn default() -> Self {
        TimeOffQuery {
            start: None,
            end: None,
            page: 1,
            page_size: 50,
            statuses: vec![TimeOffStatus::Approved],
            users: Vec::new(),
        }
    }
}

pub struct ClockifyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ClockifyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(ClockifyClient {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch one page of time-off requests and return the raw response body.
    pub async fn fetch_time_off_requests(
        &self,
        workspace_id: &str,
        query: &TimeOffQuery,
    ) -> Result<Vec<u8>, FetchError> {
        let url = format!(
            "{}/workspaces/{}/time-off/requests",
            self.base_url, workspace_id
        );

        tracing::debug!(%url, page = query.page, page_size = query.page_size, "fetching time-off requests");

        let response = self
            .http
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}

/// Re-indent a JSON document with two spaces. Key order and number text
/// are kept as received.
pub fn pretty_json(bytes: &[u8]) -> Result<String, serde_json::Error> {
    let document: &RawValue = serde_json::from_slice(bytes)?;
    Ok(reindent(document.get()))
}

/// Only valid JSON may be passed in; whitespace outside strings is rewritten.
fn reindent(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut chars = json.chars().peekable();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                out.push(c);
                while chars.next_if(char::is_ascii_whitespace).is_some() {}
                if let Some(close) = chars.next_if(|next| matches!(*next, '}' | ']')) {
                    out.push(close);
                } else {
                    depth += 1;
                    newline(&mut out, depth);
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(c);
                newline(&mut out, depth);
            }
            ':' => out.push_str(": "),
            _ if c.is_ascii_whitespace() => {}
            _ => out.push(c),
        }
    }

    out
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    out.extend(std::iter::repeat_n("  ", depth));
}
