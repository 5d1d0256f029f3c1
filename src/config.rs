use std::path::PathBuf;

use config::{Config, Environment};
use ooo_sync_core::SetupError;
use ooo_sync_core::clockify::ClockifyClient;
use ooo_sync_provider_google::ServiceAccountKey;
use serde::Deserialize;

/// Settings read from the process environment.
///
/// Empty values count as unset. Nothing is required up front; each accessor
/// reports the variable it needs so a run fails before any network call.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    clockify_api_key: Option<String>,
    workspace_id: Option<String>,
    google_service_account_json_b64: Option<String>,
    google_service_account_file: Option<PathBuf>,
    clockify_force_user_id: Option<String>,
    clockify_base_url: Option<String>,
    google_api_base_url: Option<String>,
}

/// Load `.env` into the environment if present. Returns false when absent.
pub fn load_dotenv() -> bool {
    dotenvy::dotenv().is_ok()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Settings {
    pub fn load() -> Result<Self, SetupError> {
        Self::from_environment(Environment::default())
    }

    fn from_environment(environment: Environment) -> Result<Self, SetupError> {
        Config::builder()
            .add_source(environment)
            .build()
            .map_err(|e| SetupError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SetupError::Config(e.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn from_vars(vars: &[(&str, &str)]) -> Self {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_environment(Environment::default().source(Some(source))).unwrap()
    }

    pub fn workspace_id(&self) -> Result<&str, SetupError> {
        present(&self.workspace_id).ok_or(SetupError::MissingEnv("WORKSPACE_ID"))
    }

    /// Restricts fetches to one Clockify user, for development.
    pub fn forced_user_id(&self) -> Option<&str> {
        present(&self.clockify_force_user_id)
    }

    pub fn clockify_client(&self) -> Result<ClockifyClient, SetupError> {
        let api_key =
            present(&self.clockify_api_key).ok_or(SetupError::MissingEnv("CLOCKIFY_API_KEY"))?;

        let client = ClockifyClient::new(api_key)
            .map_err(|e| SetupError::Config(format!("http client: {}", e)))?;

        Ok(match present(&self.clockify_base_url) {
            Some(base_url) => client.with_base_url(base_url),
            None => client,
        })
    }

    /// Calendar API root, when not Google's own.
    pub fn google_api_base_url(&self) -> Option<&str> {
        present(&self.google_api_base_url)
    }

    /// The inline base64 key wins over the key file.
    pub fn service_account(&self) -> Result<ServiceAccountKey, SetupError> {
        if let Some(encoded) = present(&self.google_service_account_json_b64) {
            return ServiceAccountKey::from_base64(encoded);
        }

        match &self.google_service_account_file {
            Some(path) if !path.as_os_str().is_empty() => ServiceAccountKey::from_file(path),
            _ => Err(SetupError::MissingEnv("GOOGLE_SERVICE_ACCOUNT_JSON_B64")),
        }
    }
}
