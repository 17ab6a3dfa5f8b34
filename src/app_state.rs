//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::MonitorService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Aggregation service backing every monitor endpoint.
    pub monitor: Arc<MonitorService>,
}
