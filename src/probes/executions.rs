//! Query-execution probes: what is running now, and what has been
//! expensive historically (`pg_stat_activity`, `pg_stat_statements`).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dispatch::SqlProbe;

/// Which executions probe a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Currently executing statements (default).
    Active,
    /// Statements with the highest cumulative execution time.
    Expensive,
}

impl Section {
    /// Resolves the `?section=` parameter; unrecognized values fall back
    /// to the domain default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("expensive") => Self::Expensive,
            _ => Self::Active,
        }
    }
}

/// One currently executing statement.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQueryRow {
    /// Backend process id.
    pub session_id: i32,
    /// When the statement started.
    pub start_time: Option<DateTime<Utc>>,
    /// Elapsed execution time in milliseconds.
    pub elapsed_ms: f64,
    /// Backend state.
    pub status: String,
    /// Database the statement runs in.
    pub database: String,
    /// Login that issued the statement.
    pub login_name: String,
    /// Client address, empty for local connections.
    pub host_name: String,
    /// Wait event the backend is currently in, if any.
    pub wait_type: Option<String>,
    /// Pid of the first backend blocking this one, if any.
    pub blocking_session_id: Option<i32>,
    /// The statement text.
    pub sql_text: String,
}

/// One statement aggregate from the statement statistics store.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatementStatRow {
    /// Normalized statement text.
    pub sql_text: String,
    /// Number of executions.
    pub execution_count: i64,
    /// Cumulative execution time in milliseconds.
    pub total_exec_ms: f64,
    /// Mean execution time in milliseconds.
    pub avg_exec_ms: f64,
    /// Rows returned or affected in total.
    pub total_rows: i64,
    /// Shared buffer blocks read from disk.
    pub blocks_read: i64,
    /// Shared buffer blocks served from cache.
    pub blocks_hit: i64,
}

const ACTIVE_QUERIES_SQL: &str = "\
SELECT
  a.pid AS session_id,
  a.query_start AS start_time,
  COALESCE(EXTRACT(EPOCH FROM now() - a.query_start) * 1000, 0)::float8 AS elapsed_ms,
  COALESCE(a.state, 'unknown') AS status,
  COALESCE(a.datname, '') AS database,
  COALESCE(a.usename, '') AS login_name,
  COALESCE(a.client_addr::text, '') AS host_name,
  CASE
    WHEN a.wait_event IS NULL THEN NULL
    ELSE a.wait_event_type || '/' || a.wait_event
  END AS wait_type,
  (pg_blocking_pids(a.pid))[1] AS blocking_session_id,
  a.query AS sql_text
FROM pg_stat_activity a
WHERE a.state = 'active'
  AND a.pid <> pg_backend_pid()
ORDER BY a.query_start";

const EXPENSIVE_QUERIES_SQL: &str = "\
SELECT
  s.query AS sql_text,
  s.calls AS execution_count,
  s.total_exec_time::float8 AS total_exec_ms,
  s.mean_exec_time::float8 AS avg_exec_ms,
  s.rows AS total_rows,
  s.shared_blks_read AS blocks_read,
  s.shared_blks_hit AS blocks_hit
FROM pg_stat_statements s
ORDER BY s.total_exec_time DESC
LIMIT 50";

/// Active statements probe.
pub const ACTIVE: SqlProbe<ActiveQueryRow> = SqlProbe::new(ACTIVE_QUERIES_SQL);

/// Expensive statements probe.
pub const EXPENSIVE: SqlProbe<StatementStatRow> = SqlProbe::new(EXPENSIVE_QUERIES_SQL);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_defaults_to_active() {
        assert_eq!(Section::from_param(None), Section::Active);
        assert_eq!(Section::from_param(Some("nope")), Section::Active);
        assert_eq!(Section::from_param(Some("expensive")), Section::Expensive);
    }
}
