//! Service-account credentials and the JWT-bearer token exchange that lets
//! the account act as a Workspace user.

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use ooo_sync_core::{CalendarError, SetupError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Google caps assertion lifetime at one hour
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are fetched again.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The fields of a downloaded service-account JSON key that we use.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Parse a key file's contents. The private key is checked here so a bad
    /// credential is caught before any request is processed.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SetupError> {
        let key: ServiceAccountKey = serde_json::from_slice(bytes)
            .map_err(|e| SetupError::Credential(format!("service account JSON: {}", e)))?;

        if key.client_email.trim().is_empty() {
            return Err(SetupError::Credential(
                "service account JSON has an empty client_email".to_string(),
            ));
        }

        key.encoding_key()?;
        Ok(key)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, SetupError> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
            SetupError::Credential(format!("invalid base64 GOOGLE_SERVICE_ACCOUNT_JSON_B64: {}", e))
        })?;
        Self::from_json(&bytes)
    }

    pub fn from_file(path: &Path) -> Result<Self, SetupError> {
        let bytes = std::fs::read(path).map_err(|e| {
            SetupError::Credential(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&bytes)
    }

    pub(crate) fn encoding_key(&self) -> Result<EncodingKey, SetupError> {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| SetupError::Credential(format!("service account private_key: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Signed assertion asking `audience` for a token acting as `subject`.
pub(crate) fn assertion(
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
    subject: &str,
    audience: &str,
    now: DateTime<Utc>,
) -> Result<String, CalendarError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let iat = now.timestamp();
    let claims = Claims {
        iss: &key.client_email,
        sub: subject,
        scope: CALENDAR_SCOPE,
        aud: audience,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    jsonwebtoken::encode(&header, &claims, encoding_key)
        .map_err(|e| CalendarError::Auth(format!("failed to sign assertion: {}", e)))
}

/// Bearer token for one impersonated user.
#[derive(Debug, Clone)]
pub(crate) struct AccessToken {
    pub value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

pub(crate) async fn exchange(
    http: &reqwest::Client,
    token_uri: &str,
    assertion: &str,
) -> Result<AccessToken, CalendarError> {
    let response = http
        .post(token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CalendarError::Auth(describe_token_error(status.as_u16(), &body)));
    }

    #[derive(Deserialize)]
    struct TokenResponse {
        access_token: String,
        expires_in: i64,
    }

    let data: TokenResponse = response.json().await?;

    Ok(AccessToken {
        value: data.access_token,
        expires_at: Utc::now() + Duration::seconds(data.expires_in),
    })
}

/// `unauthorized_client: Client is unauthorized...` when Google explains
/// itself, the raw body otherwise.
fn describe_token_error(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct TokenError {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    }

    match serde_json::from_str::<TokenError>(body) {
        Ok(TokenError {
            error,
            error_description: Some(description),
        }) => format!("{}: {}", error, description),
        Ok(TokenError { error, .. }) => error,
        Err(_) => format!("token endpoint returned {}: {}", status, body.trim()),
    }
}
