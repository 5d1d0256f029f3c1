//! Calendar v3 REST calls on behalf of an impersonated user.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use jsonwebtoken::EncodingKey;
use ooo_sync_core::{
    CalendarError, CalendarEvent, CalendarProvider, CalendarService, EventFilter, NewEvent,
    SetupError,
};
use serde::de::DeserializeOwned;
use url::Url;

use crate::service_account::{self, AccessToken, ServiceAccountKey};
use crate::types::{ApiErrorEnvelope, EventList, GoogleEvent};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// A lookup only needs to know whether a correlated event exists.
const LOOKUP_MAX_RESULTS: &str = "10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hands out calendars acting as individual Workspace users.
pub struct GoogleProvider {
    http: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token_uri: String,
    api_base: Url,
    /// Keyed by impersonated user
    tokens: Mutex<HashMap<String, AccessToken>>,
}

impl GoogleProvider {
    pub fn new(key: ServiceAccountKey) -> Result<Self, SetupError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SetupError::Config(format!("http client: {}", e)))?;

        let encoding_key = key.encoding_key()?;
        let token_uri = key.token_uri.clone();

        Ok(GoogleProvider {
            http,
            key,
            encoding_key,
            token_uri,
            api_base: parse_api_base(DEFAULT_API_BASE)?,
            tokens: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, SetupError> {
        self.api_base = parse_api_base(api_base)?;
        Ok(self)
    }

    fn cached_token(&self, user_email: &str) -> Option<AccessToken> {
        let tokens = self.tokens.lock().ok()?;
        tokens
            .get(user_email)
            .filter(|token| !token.is_expired())
            .cloned()
    }

    async fn access_token(&self, user_email: &str) -> Result<AccessToken, CalendarError> {
        if let Some(token) = self.cached_token(user_email) {
            return Ok(token);
        }

        tracing::debug!(user = user_email, "requesting delegated access token");

        let assertion = service_account::assertion(
            &self.key,
            &self.encoding_key,
            user_email,
            &self.token_uri,
            Utc::now(),
        )?;
        let token = service_account::exchange(&self.http, &self.token_uri, &assertion).await?;

        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(user_email.to_string(), token.clone());
        }

        Ok(token)
    }
}

fn parse_api_base(api_base: &str) -> Result<Url, SetupError> {
    let url = Url::parse(api_base)
        .map_err(|e| SetupError::Config(format!("invalid calendar API base {:?}: {}", api_base, e)))?;

    if url.cannot_be_a_base() {
        return Err(SetupError::Config(format!(
            "invalid calendar API base {:?}",
            api_base
        )));
    }

    Ok(url)
}

#[async_trait]
impl CalendarProvider for GoogleProvider {
    type Calendar = GoogleCalendar;

    async fn impersonate(&self, user_email: &str) -> Result<GoogleCalendar, CalendarError> {
        let token = self.access_token(user_email).await?;

        Ok(GoogleCalendar {
            http: self.http.clone(),
            api_base: self.api_base.clone(),
            access_token: token.value,
        })
    }
}

/// Calendar access for one user.
pub struct GoogleCalendar {
    http: reqwest::Client,
    api_base: Url,
    access_token: String,
}

impl GoogleCalendar {
    fn events_url(&self, calendar_id: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["calendars", calendar_id, "events"]);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CalendarError> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(response.json().await?)
    }
}

/// Google's `error.message`, or the raw body if it isn't the usual envelope.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn list_events(
        &self,
        calendar_id: &str,
        filter: &EventFilter,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        let (key, value) = &filter.private_property;
        let property = format!("{}={}", key, value);
        let time_min = filter.time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = filter.time_max.to_rfc3339_opts(SecondsFormat::Secs, true);

        let request = self.http.get(self.events_url(calendar_id)).query(&[
            ("privateExtendedProperty", property.as_str()),
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("maxResults", LOOKUP_MAX_RESULTS),
            ("singleEvents", "true"),
            ("showDeleted", "false"),
        ]);

        let list: EventList = self.send(request).await?;
        Ok(list.items.into_iter().map(CalendarEvent::from).collect())
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &NewEvent,
    ) -> Result<CalendarEvent, CalendarError> {
        let body = GoogleEvent::from(event);
        let request = self.http.post(self.events_url(calendar_id)).json(&body);

        let created: GoogleEvent = self.send(request).await?;
        Ok(CalendarEvent::from(created))
    }
}
