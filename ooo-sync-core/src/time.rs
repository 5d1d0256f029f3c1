//! Timestamp parsing and the wire format Clockify expects for range filters.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// A timestamp layout accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantFormat {
    /// `2025-08-01T09:30:00.123456789+02:00`, numeric offset required
    Rfc3339Nanos,
    /// `2025-08-01T09:30:00Z`
    Rfc3339,
    /// `2025-08-01`, read as midnight UTC
    DateOnly,
}

/// Tried in order. On total failure the error of the last one is reported.
///
/// Layouts are fixed width: a space instead of `T`, or one-digit fields
/// like `2025-8-1`, are rejected even where chrono alone would accept them.
const ACCEPTED_FORMATS: [InstantFormat; 3] = [
    InstantFormat::Rfc3339Nanos,
    InstantFormat::Rfc3339,
    InstantFormat::DateOnly,
];

/// Why one format did not match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("input does not have the {0} layout")]
    Shape(InstantFormat),
    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
}

impl InstantFormat {
    fn parse(self, s: &str) -> Result<DateTime<Utc>, LayoutError> {
        if !self.has_shape(s.as_bytes()) {
            return Err(LayoutError::Shape(self));
        }

        let instant = match self {
            InstantFormat::Rfc3339Nanos => DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z")
                .map(|dt| dt.with_timezone(&Utc))?,
            InstantFormat::Rfc3339 => {
                DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))?
            }
            InstantFormat::DateOnly => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::default()).and_utc())?,
        };
        Ok(instant)
    }

    /// Fixed positions: `YYYY-MM-DD`, then `THH:MM:SS` for the timestamp layouts.
    fn has_shape(self, b: &[u8]) -> bool {
        let digits = |range: std::ops::Range<usize>| {
            b.get(range).is_some_and(|part| part.iter().all(u8::is_ascii_digit))
        };
        let at = |i: usize, c: u8| b.get(i) == Some(&c);

        let date = digits(0..4) && at(4, b'-') && digits(5..7) && at(7, b'-') && digits(8..10);
        match self {
            InstantFormat::DateOnly => date && b.len() == 10,
            InstantFormat::Rfc3339Nanos | InstantFormat::Rfc3339 => {
                date && at(10, b'T')
                    && digits(11..13)
                    && at(13, b':')
                    && digits(14..16)
                    && at(16, b':')
                    && digits(17..19)
            }
        }
    }
}

impl fmt::Display for InstantFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstantFormat::Rfc3339Nanos => write!(f, "RFC3339 with nanoseconds"),
            InstantFormat::Rfc3339 => write!(f, "RFC3339"),
            InstantFormat::DateOnly => write!(f, "YYYY-MM-DD"),
        }
    }
}

/// Carries only the error of the last format tried, not a summary of all of them.
#[derive(Error, Debug, Clone)]
#[error("cannot parse time {input:?} (last tried {format}): {source}")]
pub struct TimeParseError {
    pub input: String,
    pub format: InstantFormat,
    #[source]
    pub source: LayoutError,
}

/// Parse a timestamp in any accepted format, normalized to UTC.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let [earlier @ .., last] = ACCEPTED_FORMATS;

    if let Some(instant) = earlier.iter().find_map(|format| format.parse(s).ok()) {
        return Ok(instant);
    }

    last.parse(s).map_err(|source| TimeParseError {
        input: s.to_string(),
        format: last,
        source,
    })
}

/// Clockify expects `YYYY-MM-DDTHH:MM:SS.ffffffZ` (microseconds, UTC).
pub fn format_for_source_api(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

pub fn parse_and_format_for_source_api(s: &str) -> Result<String, TimeParseError> {
    parse_instant(s).map(format_for_source_api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn parses_utc_rfc3339() {
        let t = parse_instant("2025-12-10T23:59:59Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 12, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn parses_fractional_seconds() {
        let t = parse_instant("2025-12-10T08:00:00.123456789Z").unwrap();
        assert_eq!(t.nanosecond(), 123_456_789);
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        let t = parse_instant("2025-12-10T02:00:00.5+02:00").unwrap();
        assert_eq!(t.hour(), 0);
        assert_eq!(t.nanosecond(), 500_000_000);
        assert_eq!(t.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 10).unwrap());
    }

    #[test]
    fn date_only_is_midnight_utc() {
        let t = parse_instant("2025-08-01").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn failure_reports_last_format() {
        let err = parse_instant("not-a-date").unwrap_err();
        assert_eq!(err.format, InstantFormat::DateOnly);
        assert_eq!(err.input, "not-a-date");
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn space_separator_is_rejected() {
        assert!(parse_instant("2025-12-10 08:00:00Z").is_err());
        assert!(parse_instant("2025-12-10 08:00:00.5+02:00").is_err());
        assert!(parse_instant("2025-12-10t08:00:00Z").is_err());
    }

    #[test]
    fn short_date_fields_are_rejected() {
        let err = parse_instant("2025-8-1").unwrap_err();
        assert!(matches!(err.source, LayoutError::Shape(InstantFormat::DateOnly)));
        assert!(parse_instant("2025-08-1").is_err());
        assert!(parse_instant("2025-08-01T9:30:00Z").is_err());
    }

    #[test]
    fn invalid_calendar_date_reports_chrono_error() {
        let err = parse_instant("2025-02-30").unwrap_err();
        assert!(matches!(err.source, LayoutError::Chrono(_)));
    }

    #[test]
    fn empty_string_is_rejected() {
        assert!(parse_instant("").is_err());
    }

    #[test]
    fn source_api_format_has_six_fraction_digits() {
        let t = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        assert_eq!(format_for_source_api(t), "2025-08-01T00:00:00.000000Z");

        let t = parse_instant("2025-08-10T23:59:59.123456789Z").unwrap();
        assert_eq!(format_for_source_api(t), "2025-08-10T23:59:59.123456Z");
    }

    #[test]
    fn parse_and_format_accepts_date_only() {
        assert_eq!(
            parse_and_format_for_source_api("2025-08-01").unwrap(),
            "2025-08-01T00:00:00.000000Z"
        );
        assert!(parse_and_format_for_source_api("yesterday").is_err());
    }
}
