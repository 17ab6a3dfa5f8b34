//! Performance probes: CPU samples, wait aggregates, per-database I/O,
//! sequential-scan hot spots, and headline counters.
//!
//! CPU samples come from the `monitoring.cpu_samples` table maintained by
//! the host agent; everything else reads the standard statistics views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dispatch::SqlProbe;

/// Which performance probe a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Recent CPU utilization samples (default).
    Cpu,
    /// Wait-event aggregates over active backends.
    Waits,
    /// Per-database I/O timings.
    Io,
    /// Tables dominated by sequential scans.
    Indexes,
    /// Headline throughput and cache counters.
    Counters,
}

impl Section {
    /// Resolves the `?section=` parameter; unrecognized values fall back
    /// to the domain default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("waits") => Self::Waits,
            Some("io") => Self::Io,
            Some("indexes") => Self::Indexes,
            Some("counters") => Self::Counters,
            _ => Self::Cpu,
        }
    }
}

/// One host CPU sample.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CpuSampleRow {
    /// Sample time.
    pub event_time: DateTime<Utc>,
    /// Share of CPU used by the database process.
    pub db_process_percent: f64,
    /// Idle share.
    pub system_idle_percent: f64,
    /// Share used by everything else on the host.
    pub other_process_percent: f64,
}

/// Wait-event aggregate across currently active backends.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WaitStatRow {
    /// Wait event type, `"CPU"` when the backend is not waiting.
    pub wait_type: String,
    /// Number of backends currently in this wait.
    pub waiting_tasks_count: i64,
    /// Summed time since those backends changed state, in milliseconds.
    pub wait_time_ms: f64,
    /// Mean of the above.
    pub avg_wait_ms: f64,
}

/// Per-database I/O statistics.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IoStatRow {
    /// Database name.
    pub database: String,
    /// Data read from disk, in MB.
    pub reads_mb: f64,
    /// Data found in cache, in MB.
    pub cached_mb: f64,
    /// Time spent reading, in milliseconds.
    pub io_stall_read_ms: f64,
    /// Time spent writing, in milliseconds.
    pub io_stall_write_ms: f64,
}

/// A table whose reads are dominated by sequential scans.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SeqScanRow {
    /// Schema-qualified table name.
    pub table_name: String,
    /// Sequential scan count.
    pub seq_scans: i64,
    /// Rows read by sequential scans.
    pub seq_rows_read: i64,
    /// Index scan count.
    pub index_scans: i64,
    /// Live row estimate.
    pub row_estimate: i64,
}

/// Headline counters for one server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CounterRow {
    /// Buffer cache hit ratio, 0–100.
    pub cache_hit_ratio: f64,
    /// Transactions committed since stats reset.
    pub xact_commits: i64,
    /// Transactions rolled back since stats reset.
    pub xact_rollbacks: i64,
    /// Deadlocks detected since stats reset.
    pub deadlocks: i64,
    /// Temp files spilled since stats reset.
    pub temp_files: i64,
    /// Currently connected backends.
    pub active_backends: i64,
    /// Configured connection limit.
    pub max_connections: i64,
}

const CPU_HISTORY_SQL: &str = "\
SELECT
  sample_time AS event_time,
  db_percent::float8 AS db_process_percent,
  idle_percent::float8 AS system_idle_percent,
  other_percent::float8 AS other_process_percent
FROM monitoring.cpu_samples
ORDER BY sample_time DESC
LIMIT 60";

const WAIT_STATS_SQL: &str = "\
SELECT
  COALESCE(wait_event_type, 'CPU') AS wait_type,
  count(*) AS waiting_tasks_count,
  COALESCE(sum(EXTRACT(EPOCH FROM now() - state_change) * 1000), 0)::float8 AS wait_time_ms,
  COALESCE(avg(EXTRACT(EPOCH FROM now() - state_change) * 1000), 0)::float8 AS avg_wait_ms
FROM pg_stat_activity
WHERE state = 'active' AND pid <> pg_backend_pid()
GROUP BY 1
ORDER BY wait_time_ms DESC";

const IO_STATS_SQL: &str = "\
SELECT
  d.datname AS database,
  (sd.blks_read * 8 / 1024.0)::float8 AS reads_mb,
  (sd.blks_hit * 8 / 1024.0)::float8 AS cached_mb,
  sd.blk_read_time::float8 AS io_stall_read_ms,
  sd.blk_write_time::float8 AS io_stall_write_ms
FROM pg_stat_database sd
JOIN pg_database d ON d.oid = sd.datid
WHERE NOT d.datistemplate
ORDER BY sd.blks_read DESC";

const SEQ_SCANS_SQL: &str = "\
SELECT
  schemaname || '.' || relname AS table_name,
  seq_scan AS seq_scans,
  seq_tup_read AS seq_rows_read,
  COALESCE(idx_scan, 0) AS index_scans,
  n_live_tup AS row_estimate
FROM pg_stat_user_tables
WHERE seq_scan > 0
ORDER BY seq_tup_read DESC
LIMIT 25";

const COUNTERS_SQL: &str = "\
SELECT
  CASE WHEN sum(blks_hit) + sum(blks_read) = 0 THEN 0
       ELSE (100.0 * sum(blks_hit) / (sum(blks_hit) + sum(blks_read)))
  END::float8 AS cache_hit_ratio,
  sum(xact_commit)::bigint AS xact_commits,
  sum(xact_rollback)::bigint AS xact_rollbacks,
  sum(deadlocks)::bigint AS deadlocks,
  sum(temp_files)::bigint AS temp_files,
  (SELECT count(*) FROM pg_stat_activity)::bigint AS active_backends,
  (SELECT setting::bigint FROM pg_settings WHERE name = 'max_connections') AS max_connections
FROM pg_stat_database";

/// CPU sample probe.
pub const CPU: SqlProbe<CpuSampleRow> = SqlProbe::new(CPU_HISTORY_SQL);

/// Wait aggregate probe.
pub const WAITS: SqlProbe<WaitStatRow> = SqlProbe::new(WAIT_STATS_SQL);

/// Per-database I/O probe.
pub const IO: SqlProbe<IoStatRow> = SqlProbe::new(IO_STATS_SQL);

/// Sequential-scan hot spot probe.
pub const INDEXES: SqlProbe<SeqScanRow> = SqlProbe::new(SEQ_SCANS_SQL);

/// Headline counters probe.
pub const COUNTERS: SqlProbe<CounterRow> = SqlProbe::new(COUNTERS_SQL);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_defaults_to_cpu() {
        assert_eq!(Section::from_param(None), Section::Cpu);
        assert_eq!(Section::from_param(Some("bogus")), Section::Cpu);
        assert_eq!(Section::from_param(Some("waits")), Section::Waits);
        assert_eq!(Section::from_param(Some("io")), Section::Io);
        assert_eq!(Section::from_param(Some("indexes")), Section::Indexes);
        assert_eq!(Section::from_param(Some("counters")), Section::Counters);
    }
}
