//! Run parameters shared by the CLI and the Lambda handler.

use std::fmt;
use std::str::FromStr;

use clap::Args;
use ooo_sync_core::clockify::{TimeOffQuery, TimeOffStatus};
use ooo_sync_core::time::{parse_and_format_for_source_api, parse_instant};
use ooo_sync_core::{CreatedRange, SetupError};
use serde::Deserialize;

/// How the fetched requests are narrowed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBy {
    /// Only the API's own period filter applies
    Period,
    /// Additionally keep requests created within the created bounds
    Created,
}

impl FromStr for FilterBy {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "period" => Ok(FilterBy::Period),
            "created" => Ok(FilterBy::Created),
            _ => Err(invalid("invalid by: must be 'period' or 'created'")),
        }
    }
}

impl fmt::Display for FilterBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterBy::Period => write!(f, "period"),
            FilterBy::Created => write!(f, "created"),
        }
    }
}

/// Query flags common to `fetch` and `sync`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Period start (RFC3339 or YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Period end (RFC3339 or YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Comma-separated statuses: PENDING,APPROVED,REJECTED,ALL
    #[arg(long, default_value = "APPROVED")]
    statuses: String,

    /// Page number
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Page size (1..200)
    #[arg(long, alias = "pageSize", default_value_t = 50)]
    page_size: i64,

    /// Filter mode: period|created
    #[arg(long)]
    by: Option<String>,

    /// Keep requests created at or after this instant
    #[arg(long, alias = "createdStart")]
    created_start: Option<String>,

    /// Keep requests created before this instant
    #[arg(long, alias = "createdEnd")]
    created_end: Option<String>,
}

impl QueryArgs {
    /// `default_by` applies when `--by` was not given.
    pub fn into_params(self, default_by: FilterBy) -> RunParams {
        RunParams {
            start: self.start,
            end: self.end,
            created_start: self.created_start,
            created_end: self.created_end,
            statuses: self
                .statuses
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            by: Some(self.by.unwrap_or_else(|| default_by.to_string())),
            page: Some(self.page),
            page_size: self.page_size,
        }
    }
}

/// Unvalidated parameters. Also the shape of the Lambda event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub created_start: Option<String>,
    pub created_end: Option<String>,
    pub statuses: Vec<String>,
    pub by: Option<String>,
    pub page: Option<u32>,
    pub page_size: i64,
}

#[derive(Debug, Clone)]
pub struct ValidatedRun {
    pub query: TimeOffQuery,
    pub by: FilterBy,
    pub created: CreatedRange,
}

impl ValidatedRun {
    /// True when the raw response is narrowed by creation time before use.
    pub fn filters_by_created(&self) -> bool {
        self.by == FilterBy::Created && !self.created.is_unbounded()
    }

    /// Created bounds that apply to this run; unbounded in period mode.
    pub fn created_range(&self) -> CreatedRange {
        match self.by {
            FilterBy::Created => self.created,
            FilterBy::Period => CreatedRange::default(),
        }
    }
}

fn invalid(message: impl Into<String>) -> SetupError {
    SetupError::InvalidParameter(message.into())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl RunParams {
    pub fn validate(&self) -> Result<ValidatedRun, SetupError> {
        if self.page_size <= 0 {
            return Err(invalid("invalid pageSize: must be > 0"));
        }
        let page_size =
            u32::try_from(self.page_size).map_err(|_| invalid("invalid pageSize: too large"))?;

        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(invalid("invalid page: must be > 0"));
        }

        let by: FilterBy = non_empty(&self.by)
            .ok_or_else(|| invalid("missing required parameter: by"))?
            .parse()?;

        let start = non_empty(&self.start)
            .map(parse_and_format_for_source_api)
            .transpose()
            .map_err(|e| invalid(format!("invalid start time: {}", e)))?;
        let end = non_empty(&self.end)
            .map(parse_and_format_for_source_api)
            .transpose()
            .map_err(|e| invalid(format!("invalid end time: {}", e)))?;

        if self.statuses.is_empty() {
            return Err(invalid("missing or empty statuses list"));
        }
        let statuses = self
            .statuses
            .iter()
            .map(|s| s.parse::<TimeOffStatus>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(SetupError::InvalidParameter)?;

        if by == FilterBy::Created && (start.is_none() || end.is_none()) {
            return Err(invalid(
                "when by=created is used, both start and end must be provided",
            ));
        }

        let created_from = non_empty(&self.created_start)
            .map(parse_instant)
            .transpose()
            .map_err(|e| invalid(format!("invalid createdStart: {}", e)))?;
        let created_to = non_empty(&self.created_end)
            .map(parse_instant)
            .transpose()
            .map_err(|e| invalid(format!("invalid createdEnd: {}", e)))?;

        Ok(ValidatedRun {
            query: TimeOffQuery {
                start,
                end,
                page,
                page_size,
                statuses,
                users: Vec::new(),
            },
            by,
            created: CreatedRange::new(created_from, created_to),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        query: QueryArgs,
    }

    fn created_params() -> RunParams {
        RunParams {
            start: Some("2025-12-01".to_string()),
            end: Some("2025-12-31T23:59:59Z".to_string()),
            created_start: Some("2025-11-01".to_string()),
            created_end: None,
            statuses: vec!["approved".to_string()],
            by: Some("created".to_string()),
            page: None,
            page_size: 50,
        }
    }

    fn message(params: &RunParams) -> String {
        params.validate().unwrap_err().to_string()
    }

    #[test]
    fn valid_created_run() {
        let run = created_params().validate().unwrap();

        assert_eq!(run.by, FilterBy::Created);
        assert_eq!(run.query.page, 1);
        assert_eq!(run.query.start.as_deref(), Some("2025-12-01T00:00:00.000000Z"));
        assert_eq!(run.query.end.as_deref(), Some("2025-12-31T23:59:59.000000Z"));
        assert_eq!(run.query.statuses, vec![TimeOffStatus::Approved]);
        assert!(run.created.from.is_some());
        assert!(run.created.to.is_none());
        assert!(run.filters_by_created());
    }

    #[test]
    fn page_size_must_be_positive() {
        let mut params = created_params();
        params.page_size = 0;
        assert_eq!(message(&params), "invalid pageSize: must be > 0");
        params.page_size = -5;
        assert_eq!(message(&params), "invalid pageSize: must be > 0");
    }

    #[test]
    fn by_is_required_and_checked() {
        let mut params = created_params();
        params.by = None;
        assert_eq!(message(&params), "missing required parameter: by");
        params.by = Some("updated".to_string());
        assert_eq!(message(&params), "invalid by: must be 'period' or 'created'");
    }

    #[test]
    fn statuses_must_be_present_and_known() {
        let mut params = created_params();
        params.statuses = Vec::new();
        assert_eq!(message(&params), "missing or empty statuses list");
        params.statuses = vec!["APPROVED".to_string(), "maybe".to_string()];
        assert!(message(&params).contains("\"MAYBE\""));
    }

    #[test]
    fn created_mode_needs_period_bounds() {
        let mut params = created_params();
        params.end = Some(String::new());
        assert_eq!(
            message(&params),
            "when by=created is used, both start and end must be provided"
        );

        params.by = Some("period".to_string());
        let run = params.validate().unwrap();
        assert!(!run.filters_by_created());
        assert!(run.created_range().is_unbounded());
    }

    #[test]
    fn bad_times_name_the_parameter() {
        let mut params = created_params();
        params.start = Some("yesterday".to_string());
        assert!(message(&params).starts_with("invalid start time:"));

        let mut params = created_params();
        params.created_end = Some("12/01/2025".to_string());
        assert!(message(&params).starts_with("invalid createdEnd:"));
    }

    #[test]
    fn empty_lambda_event_reports_page_size_first() {
        let params: RunParams = serde_json::from_str("{}").unwrap();
        assert_eq!(message(&params), "invalid pageSize: must be > 0");
    }

    #[test]
    fn lambda_event_uses_camel_case() {
        let params: RunParams = serde_json::from_str(
            r#"{"start":"2025-12-01","end":"2025-12-31","createdStart":"2025-11-01",
                "createdEnd":"2025-12-01","statuses":["APPROVED","PENDING"],
                "by":"created","pageSize":20}"#,
        )
        .unwrap();

        let run = params.validate().unwrap();
        assert_eq!(run.query.page_size, 20);
        assert_eq!(run.query.statuses.len(), 2);
        assert!(run.created.to.is_some());
    }

    #[test]
    fn cli_flags_and_aliases() {
        let cli = TestCli::parse_from([
            "ooo-sync",
            "--start",
            "2025-12-01",
            "--end",
            "2025-12-31",
            "--statuses",
            "approved, pending",
            "--pageSize",
            "10",
            "--createdStart",
            "2025-11-01",
        ]);

        let params = cli.query.into_params(FilterBy::Created);
        assert_eq!(params.by.as_deref(), Some("created"));
        assert_eq!(params.statuses, vec!["approved", "pending"]);

        let run = params.validate().unwrap();
        assert_eq!(run.query.page_size, 10);
        assert!(run.filters_by_created());
    }

    #[test]
    fn explicit_by_overrides_command_default() {
        let cli = TestCli::parse_from(["ooo-sync", "--by", "period"]);
        let run = cli.query.into_params(FilterBy::Created).validate().unwrap();
        assert_eq!(run.by, FilterBy::Period);
        assert_eq!(run.query.page, 1);
        assert_eq!(run.query.page_size, 50);
    }
}
