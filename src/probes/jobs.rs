//! Scheduled-job probes (`pg_cron`).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dispatch::SqlProbe;

/// Which jobs probe a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Job catalog with last/next run info (default).
    List,
    /// Recent run history across all jobs.
    History,
}

impl Section {
    /// Resolves the `?section=` parameter; unrecognized values fall back
    /// to the domain default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("history") => Self::History,
            _ => Self::List,
        }
    }
}

/// One scheduled job with its most recent run.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    /// Job identifier.
    pub job_id: String,
    /// Job name.
    pub job_name: String,
    /// Cron schedule expression.
    pub schedule: String,
    /// Whether the job is active.
    pub enabled: bool,
    /// Status of the most recent run, `"unknown"` if never run.
    pub last_run_status: String,
    /// Start of the most recent run.
    pub last_run_date: Option<DateTime<Utc>>,
    /// Duration of the most recent run in seconds.
    pub last_run_duration_sec: i64,
    /// Whether a run is currently in progress.
    pub currently_running: bool,
}

/// One historical job run.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRunRow {
    /// Job name.
    pub job_name: String,
    /// Run start time.
    pub run_date: DateTime<Utc>,
    /// Run duration in seconds.
    pub run_duration_sec: i64,
    /// Terminal run status.
    pub status: String,
    /// Message returned by the run, empty when none.
    pub message: String,
}

const JOBS_LIST_SQL: &str = "\
SELECT
  j.jobid::text AS job_id,
  j.jobname AS job_name,
  j.schedule,
  j.active AS enabled,
  COALESCE(d.status, 'unknown') AS last_run_status,
  d.start_time AS last_run_date,
  COALESCE(EXTRACT(EPOCH FROM d.end_time - d.start_time), 0)::bigint AS last_run_duration_sec,
  EXISTS (
    SELECT 1 FROM cron.job_run_details r
    WHERE r.jobid = j.jobid AND r.status = 'running'
  ) AS currently_running
FROM cron.job j
LEFT JOIN LATERAL (
  SELECT status, start_time, end_time
  FROM cron.job_run_details r
  WHERE r.jobid = j.jobid
  ORDER BY r.start_time DESC
  LIMIT 1
) d ON true
ORDER BY j.jobname";

const JOBS_HISTORY_SQL: &str = "\
SELECT
  j.jobname AS job_name,
  r.start_time AS run_date,
  COALESCE(EXTRACT(EPOCH FROM r.end_time - r.start_time), 0)::bigint AS run_duration_sec,
  COALESCE(r.status, 'unknown') AS status,
  COALESCE(r.return_message, '') AS message
FROM cron.job_run_details r
JOIN cron.job j USING (jobid)
ORDER BY r.start_time DESC
LIMIT 100";

/// Job catalog probe.
pub const LIST: SqlProbe<JobRow> = SqlProbe::new(JOBS_LIST_SQL);

/// Run history probe.
pub const HISTORY: SqlProbe<JobRunRow> = SqlProbe::new(JOBS_HISTORY_SQL);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_defaults_to_list() {
        assert_eq!(Section::from_param(None), Section::List);
        assert_eq!(Section::from_param(Some("bogus")), Section::List);
        assert_eq!(Section::from_param(Some("history")), Section::History);
    }
}
