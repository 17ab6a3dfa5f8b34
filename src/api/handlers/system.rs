//! System endpoints: gateway liveness and the configured server catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::ServerInfo;

/// Liveness check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    /// `"healthy"` whenever the process can answer at all.
    pub status: String,
    /// Current time, RFC 3339.
    pub timestamp: String,
    /// Crate version serving the request.
    pub version: String,
}

/// `GET /health` — Gateway liveness status.
///
/// Reports on the gateway process only; monitored-server health is what
/// the monitor endpoints are for.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Gateway liveness",
    description = "Returns gateway process status, version, and current timestamp.",
    responses(
        (status = 200, description = "Gateway is up", body = LivenessResponse),
    )
)]
pub async fn liveness_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/servers` — The configured fleet catalog.
#[utoipa::path(
    get,
    path = "/config/servers",
    tag = "System",
    summary = "List configured servers",
    description = "Returns key, label, host, and database for every monitored server, in declaration order.",
    responses(
        (status = 200, description = "Server catalog", body = Vec<ServerInfo>),
    )
)]
pub async fn servers_handler(State(state): State<AppState>) -> impl IntoResponse {
    let catalog: Vec<ServerInfo> = state.monitor.registry().servers().to_vec();
    (StatusCode::OK, Json(catalog))
}

/// System routes mounted at the root level (not under /api/monitor).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness_handler))
        .route("/config/servers", get(servers_handler))
}
