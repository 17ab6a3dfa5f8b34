//! Monitor service: the aggregation boundary handlers call into.
//!
//! Resolves the request's server selector, fans the chosen probe out, and
//! merges the outcomes. One method call here is one aggregation call in
//! the envelope sense: it never fails, it returns an envelope.

use std::sync::Arc;

use crate::dispatch::{self, Probe, QueryDispatcher};
use crate::domain::{ResponseEnvelope, ServerRegistry};
use crate::pool::ConnectionPoolManager;

/// Orchestrates selector resolution, fan-out, and aggregation.
///
/// Stateless apart from the shared pool manager; one instance lives in
/// [`crate::app_state::AppState`] for the life of the process.
#[derive(Debug, Clone)]
pub struct MonitorService {
    dispatcher: QueryDispatcher,
    registry: ServerRegistry,
}

impl MonitorService {
    /// Creates a service over the given pools and fleet catalog.
    #[must_use]
    pub fn new(pools: Arc<ConnectionPoolManager>, registry: ServerRegistry) -> Self {
        Self {
            dispatcher: QueryDispatcher::new(pools),
            registry,
        }
    }

    /// Returns the fleet catalog.
    #[must_use]
    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Runs one aggregation call: resolve the selector, fan out the probe,
    /// merge the outcomes into an envelope.
    ///
    /// Per-server failures end up inside the envelope; this method itself
    /// never fails.
    pub async fn fetch<P: Probe>(
        &self,
        probe: &P,
        selector: Option<&str>,
    ) -> ResponseEnvelope<P::Row> {
        let servers = self.registry.resolve(selector);
        tracing::debug!(targets = servers.len(), "running aggregation");
        let outcomes = self.dispatcher.run(probe, &servers).await;
        dispatch::aggregator::merge(outcomes)
    }
}
