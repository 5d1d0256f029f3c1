//! Core types and sync logic for ooo-sync.
//!
//! This crate is shared by the `ooo-sync` binary and calendar providers:
//! - `clockify` fetches raw time-off requests from the Clockify API
//! - `filter` narrows a raw response by request creation time
//! - `all_day` turns a time-off period into an all-day calendar window
//! - `sync` inserts one all-day event per request, idempotently
//! - `calendar` is the capability a calendar provider must implement

pub mod all_day;
pub mod calendar;
pub mod clockify;
pub mod date_range;
pub mod error;
pub mod filter;
pub mod sync;
pub mod time;
pub mod time_off;

pub use all_day::{AllDayWindow, to_all_day_window};
pub use calendar::{CalendarEvent, CalendarProvider, CalendarService, EventFilter, NewEvent};
pub use date_range::CreatedRange;
pub use error::{CalendarError, FetchError, SetupError, SyncError};
pub use sync::{RequestOutcome, SyncOutcome, SyncReport, Synchronizer};
pub use time_off::TimeOffRequest;
