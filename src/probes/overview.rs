//! Fleet overview probe: one headline row per server.
//!
//! Unlike the other probes this one is composite: nine scalar sub-queries
//! run concurrently against the same pool and assemble a single
//! [`OverviewRow`]. Any sub-query failing — including returning no row —
//! fails the whole server's overview; missing values are surfaced as
//! errors, never zero-filled.

use serde::Serialize;
use sqlx::PgPool;

use crate::dispatch::Probe;
use crate::error::MonitorError;

/// Headline metrics for one server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRow {
    /// Latest sampled database-process CPU share.
    pub cpu_percent: f64,
    /// Backends currently executing a statement.
    pub active_sessions: i64,
    /// Backends currently blocked on another backend.
    pub blocked_sessions: i64,
    /// Scheduled jobs currently running.
    pub running_jobs: i64,
    /// Job runs that failed in the last 24 hours.
    pub failed_jobs_last24h: i64,
    /// Total on-disk size of all databases, in MB.
    pub database_size_mb: f64,
    /// Buffer cache hit ratio, 0–100.
    pub cache_hit_ratio: f64,
    /// Commit throughput since the server started.
    pub commits_per_sec: f64,
    /// Seconds since the server started.
    pub uptime_seconds: i64,
}

const CURRENT_CPU_SQL: &str = "\
SELECT db_percent::float8
FROM monitoring.cpu_samples
ORDER BY sample_time DESC
LIMIT 1";

const ACTIVE_SESSIONS_SQL: &str = "\
SELECT count(*)
FROM pg_stat_activity
WHERE state = 'active' AND pid <> pg_backend_pid()";

const BLOCKED_SESSIONS_SQL: &str = "\
SELECT count(*)
FROM pg_stat_activity
WHERE cardinality(pg_blocking_pids(pid)) > 0";

const RUNNING_JOBS_SQL: &str = "\
SELECT count(*)
FROM cron.job_run_details
WHERE status = 'running'";

const FAILED_JOBS_24H_SQL: &str = "\
SELECT count(*)
FROM cron.job_run_details
WHERE status = 'failed' AND start_time >= now() - interval '24 hours'";

const DATABASE_SIZE_SQL: &str = "\
SELECT (sum(pg_database_size(oid)) / 1048576.0)::float8
FROM pg_database
WHERE NOT datistemplate";

const CACHE_HIT_SQL: &str = "\
SELECT CASE WHEN sum(blks_hit) + sum(blks_read) = 0 THEN 0
            ELSE (100.0 * sum(blks_hit) / (sum(blks_hit) + sum(blks_read)))
       END::float8
FROM pg_stat_database";

const COMMITS_PER_SEC_SQL: &str = "\
SELECT (sum(xact_commit) /
        GREATEST(EXTRACT(EPOCH FROM now() - pg_postmaster_start_time()), 1))::float8
FROM pg_stat_database";

const UPTIME_SQL: &str = "\
SELECT EXTRACT(EPOCH FROM now() - pg_postmaster_start_time())::bigint";

/// Composite probe assembling [`OverviewRow`] from nine scalar sub-queries.
#[derive(Debug, Clone, Copy)]
pub struct OverviewProbe;

/// The overview probe instance.
pub const OVERVIEW: OverviewProbe = OverviewProbe;

impl Probe for OverviewProbe {
    type Row = OverviewRow;

    async fn fetch(&self, pool: &PgPool) -> Result<Vec<OverviewRow>, MonitorError> {
        let (
            cpu_percent,
            active_sessions,
            blocked_sessions,
            running_jobs,
            failed_jobs_last24h,
            database_size_mb,
            cache_hit_ratio,
            commits_per_sec,
            uptime_seconds,
        ) = tokio::try_join!(
            scalar::<f64>(pool, CURRENT_CPU_SQL),
            scalar::<i64>(pool, ACTIVE_SESSIONS_SQL),
            scalar::<i64>(pool, BLOCKED_SESSIONS_SQL),
            scalar::<i64>(pool, RUNNING_JOBS_SQL),
            scalar::<i64>(pool, FAILED_JOBS_24H_SQL),
            scalar::<f64>(pool, DATABASE_SIZE_SQL),
            scalar::<f64>(pool, CACHE_HIT_SQL),
            scalar::<f64>(pool, COMMITS_PER_SEC_SQL),
            scalar::<i64>(pool, UPTIME_SQL),
        )?;

        Ok(vec![OverviewRow {
            cpu_percent,
            active_sessions,
            blocked_sessions,
            running_jobs,
            failed_jobs_last24h,
            database_size_mb,
            cache_hit_ratio,
            commits_per_sec,
            uptime_seconds,
        }])
    }
}

/// Runs a single-value query. A missing row is an [`MonitorError::EmptyResult`],
/// not a silent zero.
async fn scalar<T>(pool: &PgPool, sql: &'static str) -> Result<T, MonitorError>
where
    T: Send
        + Unpin
        + for<'r> sqlx::Decode<'r, sqlx::Postgres>
        + sqlx::Type<sqlx::Postgres>,
{
    sqlx::query_scalar::<_, T>(sql)
        .fetch_one(pool)
        .await
        .map_err(MonitorError::from_sqlx)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn overview_row_serializes_camel_case() {
        let row = OverviewRow {
            cpu_percent: 12.5,
            active_sessions: 3,
            blocked_sessions: 0,
            running_jobs: 1,
            failed_jobs_last24h: 0,
            database_size_mb: 2048.0,
            cache_hit_ratio: 99.2,
            commits_per_sec: 41.0,
            uptime_seconds: 86_400,
        };
        let Ok(json) = serde_json::to_value(&row) else {
            panic!("serialize failed");
        };
        assert_eq!(json.get("cpuPercent"), Some(&serde_json::json!(12.5)));
        assert_eq!(json.get("failedJobsLast24h"), Some(&serde_json::json!(0)));
        assert_eq!(json.get("uptimeSeconds"), Some(&serde_json::json!(86_400)));
    }
}
