//! Parallel fan-out of one probe across the configured server set.
//!
//! [`QueryDispatcher`] runs a [`Probe`] against every requested server
//! concurrently and waits for all of them to reach a terminal state. A
//! single server failing or stalling never cancels or blocks its siblings;
//! each server independently yields rows or one folded error.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures_util::future::join_all;
use sqlx::PgPool;
use sqlx::postgres::PgRow;

use crate::domain::ServerKey;
use crate::error::MonitorError;
use crate::pool::ConnectionPoolManager;

/// Terminal state of one server's probe execution: either the ordered row
/// sequence the probe returned, or the single error the failure folded
/// into.
pub type ServerOutcome<R> = Result<Vec<R>, MonitorError>;

/// A named, parameterless read operation executed against one server.
///
/// Implementations are opaque to the dispatcher: it only provides a
/// connected pool and a timeout, and collects rows or an error.
pub trait Probe: Sync {
    /// Row type this probe decodes.
    type Row: Send;

    /// Executes the probe against a connected pool.
    ///
    /// # Errors
    ///
    /// Returns the per-server [`MonitorError`] the failure folds into;
    /// the dispatcher records it in the envelope instead of raising it.
    fn fetch(
        &self,
        pool: &PgPool,
    ) -> impl Future<Output = Result<Vec<Self::Row>, MonitorError>> + Send;
}

/// A probe backed by a single SQL statement, decoded row-by-row into `R`.
#[derive(Debug)]
pub struct SqlProbe<R> {
    sql: &'static str,
    _row: PhantomData<fn() -> R>,
}

impl<R> SqlProbe<R> {
    /// Creates a probe from a static SQL statement.
    #[must_use]
    pub const fn new(sql: &'static str) -> Self {
        Self {
            sql,
            _row: PhantomData,
        }
    }

    /// The statement this probe executes.
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        self.sql
    }
}

impl<R> Probe for SqlProbe<R>
where
    R: Send + Unpin + for<'r> sqlx::FromRow<'r, PgRow>,
{
    type Row = R;

    async fn fetch(&self, pool: &PgPool) -> Result<Vec<R>, MonitorError> {
        sqlx::query_as::<_, R>(self.sql)
            .fetch_all(pool)
            .await
            .map_err(MonitorError::from_sqlx)
    }
}

/// Runs one probe against many servers concurrently, isolating per-server
/// failure.
#[derive(Debug, Clone)]
pub struct QueryDispatcher {
    pools: Arc<ConnectionPoolManager>,
}

impl QueryDispatcher {
    /// Creates a dispatcher over the given pool manager.
    #[must_use]
    pub fn new(pools: Arc<ConnectionPoolManager>) -> Self {
        Self { pools }
    }

    /// Fans the probe out across `servers` and waits for every outcome.
    ///
    /// Results come back in requested order regardless of which server
    /// responded first; concurrency affects latency, never output order.
    /// There is no dispatcher-level timeout beyond the per-probe bounds.
    pub async fn run<P: Probe>(
        &self,
        probe: &P,
        servers: &[ServerKey],
    ) -> Vec<(ServerKey, ServerOutcome<P::Row>)> {
        let tasks = servers
            .iter()
            .copied()
            .map(|key| async move { (key, self.run_one(probe, key).await) });
        join_all(tasks).await
    }

    /// Runs the probe against a single server.
    ///
    /// Pool acquisition failures and probe execution failures fold into
    /// the same error channel. A connection-shaped probe failure retires
    /// the pool so the next acquisition reconnects.
    async fn run_one<P: Probe>(&self, probe: &P, key: ServerKey) -> ServerOutcome<P::Row> {
        let pool = self.pools.acquire(key).await?;
        let limit = self.pools.request_timeout(key);

        match tokio::time::timeout(limit, probe.fetch(&pool)).await {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(err)) => {
                tracing::warn!(server = %key, error = %err, "probe failed");
                if err.is_connection() {
                    self.pools.retire(key).await;
                }
                Err(err)
            }
            Err(_) => {
                tracing::warn!(server = %key, timeout_secs = limit.as_secs(), "probe timed out");
                Err(MonitorError::timed_out(limit))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, sqlx::FromRow)]
    struct DemoRow {
        #[allow(dead_code)]
        value: i64,
    }

    #[tokio::test]
    async fn unreachable_servers_fail_independently_in_requested_order() {
        // No configuration at all: every acquisition fails immediately,
        // which exercises the never-fail-fast barrier without a live server.
        let pools = Arc::new(ConnectionPoolManager::new(HashMap::new()));
        let dispatcher = QueryDispatcher::new(pools);
        let probe: SqlProbe<DemoRow> = SqlProbe::new("SELECT 1 AS value");

        let requested = [ServerKey::Db02, ServerKey::Db01];
        let outcomes = dispatcher.run(&probe, &requested).await;

        assert_eq!(outcomes.len(), 2);
        let keys: Vec<ServerKey> = outcomes.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, requested);
        for (_, outcome) in &outcomes {
            let Err(err) = outcome else {
                panic!("expected a per-server error");
            };
            assert!(err.is_connection());
        }
    }

    #[tokio::test]
    async fn empty_server_list_yields_empty_outcomes() {
        let pools = Arc::new(ConnectionPoolManager::new(HashMap::new()));
        let dispatcher = QueryDispatcher::new(pools);
        let probe: SqlProbe<DemoRow> = SqlProbe::new("SELECT 1 AS value");

        let outcomes = dispatcher.run(&probe, &[]).await;
        assert!(outcomes.is_empty());
    }

    #[test]
    fn sql_probe_exposes_its_statement() {
        let probe: SqlProbe<DemoRow> = SqlProbe::new("SELECT 1 AS value");
        assert_eq!(probe.sql(), "SELECT 1 AS value");
    }
}
