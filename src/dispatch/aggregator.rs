//! Merge of per-server outcomes into one response envelope.
//!
//! [`merge`] is deterministic given deterministic outcomes: rows keep the
//! requested cross-server order and the probe's own intra-server order,
//! and every failed server collapses to exactly one error entry. It never
//! fails; an all-servers-failed call still yields a well-formed envelope.

use chrono::Utc;

use super::dispatcher::ServerOutcome;
use crate::domain::{AggregationError, ErrorOrigin, ResponseEnvelope, ServerKey, Tagged};

/// Merges ordered per-server outcomes into a [`ResponseEnvelope`].
///
/// `outcomes` must already be in requested server order (the dispatcher
/// guarantees this); rows from each successful server are appended in the
/// order the probe returned them, tagged with their origin.
#[must_use]
pub fn merge<R>(outcomes: Vec<(ServerKey, ServerOutcome<R>)>) -> ResponseEnvelope<R> {
    let mut data = Vec::new();
    let mut errors = Vec::new();

    for (key, outcome) in outcomes {
        match outcome {
            Ok(rows) => data.extend(rows.into_iter().map(|row| Tagged { server: key, row })),
            Err(err) => errors.push(AggregationError {
                server: ErrorOrigin::Server(key),
                message: err.to_string(),
            }),
        }
    }

    ResponseEnvelope {
        success: errors.is_empty(),
        data,
        errors: (!errors.is_empty()).then_some(errors),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::MonitorError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct DemoRow(u32);

    fn rows(values: &[u32]) -> ServerOutcome<DemoRow> {
        Ok(values.iter().map(|v| DemoRow(*v)).collect())
    }

    #[test]
    fn all_servers_succeed() {
        let envelope = merge(vec![
            (ServerKey::Db01, rows(&[1, 2])),
            (ServerKey::Db02, rows(&[3])),
        ]);
        assert!(envelope.success);
        assert!(envelope.errors.is_none());
        assert_eq!(envelope.data.len(), 3);
    }

    #[test]
    fn one_of_two_servers_fails() {
        // db01 returns 3 rows, db02 times out.
        let envelope = merge(vec![
            (ServerKey::Db01, rows(&[1, 2, 3])),
            (
                ServerKey::Db02,
                Err(MonitorError::timed_out(Duration::from_secs(30))),
            ),
        ]);

        assert!(!envelope.success);
        assert_eq!(envelope.data.len(), 3);
        assert!(envelope.data.iter().all(|t| t.server == ServerKey::Db01));

        let Some(errors) = &envelope.errors else {
            panic!("expected errors");
        };
        assert_eq!(errors.len(), 1);
        let Some(first) = errors.first() else {
            panic!("expected one error");
        };
        assert_eq!(first.server, ErrorOrigin::Server(ServerKey::Db02));
        assert_eq!(first.message, "timeout after 30s");
    }

    #[test]
    fn all_servers_fail_still_yields_an_envelope() {
        let envelope: ResponseEnvelope<DemoRow> = merge(vec![
            (
                ServerKey::Db01,
                Err(MonitorError::Connection("refused".to_string())),
            ),
            (
                ServerKey::Db02,
                Err(MonitorError::Probe("bad relation".to_string())),
            ),
        ]);
        assert!(!envelope.success);
        assert!(envelope.data.is_empty());
        let Some(errors) = &envelope.errors else {
            panic!("expected errors");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn cross_server_order_follows_requested_order() {
        // Requested order db02 then db01; output must not re-sort.
        let envelope = merge(vec![
            (ServerKey::Db02, rows(&[10, 11])),
            (ServerKey::Db01, rows(&[20])),
        ]);
        let order: Vec<ServerKey> = envelope.data.iter().map(|t| t.server).collect();
        assert_eq!(order, vec![ServerKey::Db02, ServerKey::Db02, ServerKey::Db01]);
        // Intra-server order is the probe's own order.
        let values: Vec<u32> = envelope.data.iter().map(|t| t.row.0).collect();
        assert_eq!(values, vec![10, 11, 20]);
    }

    #[test]
    fn merge_is_deterministic_apart_from_timestamp() {
        let make = || {
            merge(vec![
                (ServerKey::Db01, rows(&[1])),
                (
                    ServerKey::Db02,
                    Err(MonitorError::Probe("boom".to_string())),
                ),
            ])
        };
        let a = make();
        let b = make();
        assert_eq!(a.success, b.success);
        assert_eq!(a.data.len(), b.data.len());
        let (Some(ea), Some(eb)) = (&a.errors, &b.errors) else {
            panic!("expected errors in both envelopes");
        };
        assert_eq!(ea.len(), eb.len());
        let (Some(fa), Some(fb)) = (ea.first(), eb.first()) else {
            panic!("expected one error in each");
        };
        assert_eq!(fa.message, fb.message);
    }
}
