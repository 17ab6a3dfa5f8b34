//! Session probes (`pg_stat_activity`).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dispatch::SqlProbe;

/// Which sessions probe a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// All client sessions (default).
    List,
    /// Sessions grouped per login.
    Summary,
}

impl Section {
    /// Resolves the `?section=` parameter; unrecognized values fall back
    /// to the domain default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("summary") => Self::Summary,
            _ => Self::List,
        }
    }
}

/// One client session.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    /// Backend process id.
    pub session_id: i32,
    /// Login name.
    pub login_name: String,
    /// Client address, empty for local connections.
    pub host_name: String,
    /// Application name reported by the client.
    pub program_name: String,
    /// Backend state.
    pub status: String,
    /// Database the session is connected to.
    pub database: String,
    /// When the session connected.
    pub login_time: Option<DateTime<Utc>>,
    /// When the session last started a statement.
    pub last_request_start_time: Option<DateTime<Utc>>,
    /// Whether this is a client backend (as opposed to a worker).
    pub is_user_process: bool,
}

/// Session counts per login.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryRow {
    /// Login name.
    pub login_name: String,
    /// Total sessions for this login.
    pub session_count: i64,
    /// Sessions currently executing a statement.
    pub active_count: i64,
}

const SESSIONS_SQL: &str = "\
SELECT
  a.pid AS session_id,
  COALESCE(a.usename, '') AS login_name,
  COALESCE(a.client_addr::text, '') AS host_name,
  COALESCE(a.application_name, '') AS program_name,
  COALESCE(a.state, 'unknown') AS status,
  COALESCE(a.datname, '') AS database,
  a.backend_start AS login_time,
  a.query_start AS last_request_start_time,
  (a.backend_type = 'client backend') AS is_user_process
FROM pg_stat_activity a
WHERE a.datname IS NOT NULL
ORDER BY a.backend_start";

const SESSION_SUMMARY_SQL: &str = "\
SELECT
  COALESCE(a.usename, '') AS login_name,
  count(*) AS session_count,
  count(*) FILTER (WHERE a.state = 'active') AS active_count
FROM pg_stat_activity a
WHERE a.datname IS NOT NULL
GROUP BY 1
ORDER BY session_count DESC";

/// Session list probe.
pub const LIST: SqlProbe<SessionRow> = SqlProbe::new(SESSIONS_SQL);

/// Per-login summary probe.
pub const SUMMARY: SqlProbe<SessionSummaryRow> = SqlProbe::new(SESSION_SUMMARY_SQL);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_defaults_to_list() {
        assert_eq!(Section::from_param(None), Section::List);
        assert_eq!(Section::from_param(Some("x")), Section::List);
        assert_eq!(Section::from_param(Some("summary")), Section::Summary);
    }
}
