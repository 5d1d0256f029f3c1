//! Google Calendar provider for ooo-sync.
//!
//! Acts on behalf of each Workspace user through a service account with
//! domain-wide delegation. Talks to the Calendar v3 REST API directly.

mod api;
mod service_account;
mod types;

pub use api::{DEFAULT_API_BASE, GoogleCalendar, GoogleProvider};
pub use service_account::{CALENDAR_SCOPE, DEFAULT_TOKEN_URI, ServiceAccountKey};
