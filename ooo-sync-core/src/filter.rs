//! Filter a raw Clockify response by request creation time.
//!
//! Filtering happens in two stages. The first decodes only `createdAt` from
//! each item and keeps matching items as raw JSON, so unknown fields survive
//! untouched. The second fully decodes the survivors into [`TimeOffRequest`].
//! A malformed item is dropped with a warning in either stage; only a
//! malformed envelope is an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::date_range::CreatedRange;
use crate::error::FetchError;
use crate::time::parse_instant;
use crate::time_off::TimeOffRequest;

/// Top-level shape of the time-off response, items left undecoded.
#[derive(Debug, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: Vec<Box<RawValue>>,
}

/// `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
struct CreatedOnly {
    #[serde(rename = "createdAt")]
    created_at: String,
}

/// Stage one: keep the raw items whose `createdAt` lies in `range`.
/// The returned `count` is the number of items kept.
pub fn select_by_created_at(raw: &[u8], range: &CreatedRange) -> Result<RawEnvelope, FetchError> {
    let envelope: RawEnvelope = serde_json::from_slice(raw).map_err(FetchError::Envelope)?;

    let requests: Vec<Box<RawValue>> = envelope
        .requests
        .into_iter()
        .enumerate()
        .filter(|(index, item)| created_in_range(*index, item, range))
        .map(|(_, item)| item)
        .collect();

    Ok(RawEnvelope {
        count: requests.len() as u64,
        requests,
    })
}

fn created_in_range(index: usize, item: &RawValue, range: &CreatedRange) -> bool {
    let created: CreatedOnly = match serde_json::from_str(item.get()) {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!(index, error = %e, "skipping request without a readable createdAt");
            return false;
        }
    };

    match parse_instant(&created.created_at) {
        Ok(instant) => range.contains(instant),
        Err(e) => {
            tracing::warn!(index, error = %e, "skipping request with unparseable createdAt");
            false
        }
    }
}

/// Stage two: fully decode raw items, dropping the ones that don't fit.
pub fn decode_requests(items: &[Box<RawValue>]) -> Vec<TimeOffRequest> {
    items
        .iter()
        .filter_map(|item| match serde_json::from_str::<TimeOffRequest>(item.get()) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::warn!(error = %e, "skipping bad request");
                None
            }
        })
        .collect()
}

/// Both stages: requests created within `range`, in source order.
pub fn filter_by_created_at(
    raw: &[u8],
    range: &CreatedRange,
) -> Result<Vec<TimeOffRequest>, FetchError> {
    let selected = select_by_created_at(raw, range)?;
    Ok(decode_requests(&selected.requests))
}
