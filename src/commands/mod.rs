pub mod fetch;
pub mod insert;
pub mod sync;

use anyhow::{Context, Result};
use ooo_sync_provider_google::GoogleProvider;

use crate::config::Settings;
use crate::params::ValidatedRun;

/// Fetch one page of time-off requests as raw JSON bytes.
pub async fn fetch_raw(settings: &Settings, run: &ValidatedRun) -> Result<Vec<u8>> {
    let client = settings.clockify_client()?;
    let workspace_id = settings.workspace_id()?;

    let mut query = run.query.clone();
    if let Some(user) = settings.forced_user_id() {
        tracing::warn!(user, "CLOCKIFY_FORCE_USER_ID active: only syncing this user");
        query.users = vec![user.to_string()];
    }

    client
        .fetch_time_off_requests(workspace_id, &query)
        .await
        .context("fetch clockify")
}

/// Calendar provider from the configured service account.
pub fn google_provider(settings: &Settings) -> Result<GoogleProvider> {
    let key = settings.service_account()?;
    let provider = GoogleProvider::new(key)?;

    Ok(match settings.google_api_base_url() {
        Some(api_base) => provider.with_api_base(api_base)?,
        None => provider,
    })
}
