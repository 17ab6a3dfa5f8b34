//! Lock contention probes: blocking chains and lock waits
//! (`pg_stat_activity`, `pg_locks`).

use serde::Serialize;

use crate::dispatch::SqlProbe;

/// Which locks probe a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Blocker/blocked session pairs (default).
    Blocking,
    /// Individual lock waits.
    Waits,
}

impl Section {
    /// Resolves the `?section=` parameter; unrecognized values fall back
    /// to the domain default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("waits") => Self::Waits,
            _ => Self::Blocking,
        }
    }
}

/// One blocker/blocked session pair.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlockingChainRow {
    /// Pid of the blocking backend.
    pub blocker_session_id: i32,
    /// Login of the blocking backend.
    pub blocker_login_name: String,
    /// Statement the blocker is running.
    pub blocker_sql_text: String,
    /// Pid of the blocked backend.
    pub blocked_session_id: i32,
    /// Login of the blocked backend.
    pub blocked_login_name: String,
    /// Statement the blocked backend is waiting to run.
    pub blocked_sql_text: String,
    /// Wait event the blocked backend is in.
    pub blocked_wait_type: String,
    /// How long the blocked statement has been waiting, in milliseconds.
    pub blocked_wait_ms: f64,
}

/// One lock wait entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LockWaitRow {
    /// Pid of the waiting backend.
    pub session_id: i32,
    /// Kind of lockable object.
    pub lock_type: String,
    /// Requested lock mode.
    pub lock_mode: String,
    /// `"granted"` or `"waiting"`.
    pub lock_status: String,
    /// Locked relation name, if the lock targets a relation.
    pub object_name: Option<String>,
    /// How long the backend has been waiting, in milliseconds.
    pub wait_time_ms: f64,
}

const BLOCKING_CHAINS_SQL: &str = "\
SELECT
  blocker.pid AS blocker_session_id,
  COALESCE(blocker.usename, '') AS blocker_login_name,
  COALESCE(blocker.query, '') AS blocker_sql_text,
  blocked.pid AS blocked_session_id,
  COALESCE(blocked.usename, '') AS blocked_login_name,
  COALESCE(blocked.query, '') AS blocked_sql_text,
  COALESCE(blocked.wait_event_type || '/' || blocked.wait_event, '') AS blocked_wait_type,
  COALESCE(EXTRACT(EPOCH FROM now() - blocked.query_start) * 1000, 0)::float8 AS blocked_wait_ms
FROM pg_stat_activity blocked
JOIN LATERAL unnest(pg_blocking_pids(blocked.pid)) AS b(pid) ON true
JOIN pg_stat_activity blocker ON blocker.pid = b.pid
WHERE cardinality(pg_blocking_pids(blocked.pid)) > 0
ORDER BY blocked_wait_ms DESC";

const LOCK_WAITS_SQL: &str = "\
SELECT
  l.pid AS session_id,
  l.locktype AS lock_type,
  l.mode AS lock_mode,
  CASE WHEN l.granted THEN 'granted' ELSE 'waiting' END AS lock_status,
  l.relation::regclass::text AS object_name,
  COALESCE(EXTRACT(EPOCH FROM now() - a.query_start) * 1000, 0)::float8 AS wait_time_ms
FROM pg_locks l
JOIN pg_stat_activity a ON a.pid = l.pid
WHERE NOT l.granted
ORDER BY wait_time_ms DESC";

/// Blocking chains probe.
pub const BLOCKING: SqlProbe<BlockingChainRow> = SqlProbe::new(BLOCKING_CHAINS_SQL);

/// Lock waits probe.
pub const WAITS: SqlProbe<LockWaitRow> = SqlProbe::new(LOCK_WAITS_SQL);
