//! Creation-time window for filtering time-off requests.

use chrono::{DateTime, Utc};

use crate::time::{TimeParseError, parse_instant};

/// `[from, to)` over request creation instants.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl CreatedRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        CreatedRange { from, to }
    }

    /// Parse optional bounds given in any accepted timestamp format.
    /// Empty strings count as absent.
    pub fn from_args(from: Option<&str>, to: Option<&str>) -> Result<Self, TimeParseError> {
        let parse = |s: Option<&str>| match s {
            Some(s) if !s.is_empty() => parse_instant(s).map(Some),
            _ => Ok(None),
        };

        Ok(CreatedRange {
            from: parse(from)?,
            to: parse(to)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Inclusive lower bound, exclusive upper bound.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if self.from.is_some_and(|from| instant < from) {
            return false;
        }
        if self.to.is_some_and(|to| instant >= to) {
            return false;
        }
        true
    }
}
