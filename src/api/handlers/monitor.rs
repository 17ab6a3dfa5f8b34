//! Monitor endpoints: one handler per telemetry domain.
//!
//! Every handler follows the same shape: resolve the section to a probe,
//! run one aggregation call, return the envelope. The transport status is
//! always `200 OK` — per-server failures live inside the envelope so
//! partial data stays consumable.

use axum::Router;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;

use crate::api::dto::MonitorParams;
use crate::app_state::AppState;
use crate::probes::{executions, health, jobs, locks, overview, performance, sessions};

/// `GET /api/monitor/overview` — Headline metrics per server.
#[utoipa::path(
    get,
    path = "/api/monitor/overview",
    tag = "Monitor",
    summary = "Fleet overview",
    description = "One headline metrics row per server: CPU, sessions, jobs, size, cache, uptime.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope; per-server failures are reported inside it", body = serde_json::Value),
    )
)]
pub async fn overview_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> impl IntoResponse {
    Json(
        state
            .monitor
            .fetch(&overview::OVERVIEW, params.server.as_deref())
            .await,
    )
}

/// `GET /api/monitor/jobs` — Scheduled jobs (`section=list|history`).
#[utoipa::path(
    get,
    path = "/api/monitor/jobs",
    tag = "Monitor",
    summary = "Scheduled jobs",
    description = "Job catalog (default) or recent run history.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope", body = serde_json::Value),
    )
)]
pub async fn jobs_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let selector = params.server.as_deref();
    match jobs::Section::from_param(params.section.as_deref()) {
        jobs::Section::List => {
            Json(state.monitor.fetch(&jobs::LIST, selector).await).into_response()
        }
        jobs::Section::History => {
            Json(state.monitor.fetch(&jobs::HISTORY, selector).await).into_response()
        }
    }
}

/// `GET /api/monitor/executions` — Running and expensive statements
/// (`section=active|expensive`).
#[utoipa::path(
    get,
    path = "/api/monitor/executions",
    tag = "Monitor",
    summary = "Query executions",
    description = "Currently executing statements (default) or the most expensive historical ones.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope", body = serde_json::Value),
    )
)]
pub async fn executions_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let selector = params.server.as_deref();
    match executions::Section::from_param(params.section.as_deref()) {
        executions::Section::Active => {
            Json(state.monitor.fetch(&executions::ACTIVE, selector).await).into_response()
        }
        executions::Section::Expensive => {
            Json(state.monitor.fetch(&executions::EXPENSIVE, selector).await).into_response()
        }
    }
}

/// `GET /api/monitor/locks` — Lock contention (`section=blocking|waits`).
#[utoipa::path(
    get,
    path = "/api/monitor/locks",
    tag = "Monitor",
    summary = "Lock contention",
    description = "Blocker/blocked chains (default) or raw lock waits.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope", body = serde_json::Value),
    )
)]
pub async fn locks_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let selector = params.server.as_deref();
    match locks::Section::from_param(params.section.as_deref()) {
        locks::Section::Blocking => {
            Json(state.monitor.fetch(&locks::BLOCKING, selector).await).into_response()
        }
        locks::Section::Waits => {
            Json(state.monitor.fetch(&locks::WAITS, selector).await).into_response()
        }
    }
}

/// `GET /api/monitor/performance` — Performance telemetry
/// (`section=cpu|waits|io|indexes|counters`).
#[utoipa::path(
    get,
    path = "/api/monitor/performance",
    tag = "Monitor",
    summary = "Performance telemetry",
    description = "CPU samples (default), wait aggregates, I/O timings, seq-scan hot spots, or headline counters.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope", body = serde_json::Value),
    )
)]
pub async fn performance_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let selector = params.server.as_deref();
    match performance::Section::from_param(params.section.as_deref()) {
        performance::Section::Cpu => {
            Json(state.monitor.fetch(&performance::CPU, selector).await).into_response()
        }
        performance::Section::Waits => {
            Json(state.monitor.fetch(&performance::WAITS, selector).await).into_response()
        }
        performance::Section::Io => {
            Json(state.monitor.fetch(&performance::IO, selector).await).into_response()
        }
        performance::Section::Indexes => {
            Json(state.monitor.fetch(&performance::INDEXES, selector).await).into_response()
        }
        performance::Section::Counters => {
            Json(state.monitor.fetch(&performance::COUNTERS, selector).await).into_response()
        }
    }
}

/// `GET /api/monitor/sessions` — Client sessions (`section=list|summary`).
#[utoipa::path(
    get,
    path = "/api/monitor/sessions",
    tag = "Monitor",
    summary = "Client sessions",
    description = "Session list (default) or per-login summary.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope", body = serde_json::Value),
    )
)]
pub async fn sessions_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let selector = params.server.as_deref();
    match sessions::Section::from_param(params.section.as_deref()) {
        sessions::Section::List => {
            Json(state.monitor.fetch(&sessions::LIST, selector).await).into_response()
        }
        sessions::Section::Summary => {
            Json(state.monitor.fetch(&sessions::SUMMARY, selector).await).into_response()
        }
    }
}

/// `GET /api/monitor/health` — Storage health (`section=size|backups|files`).
#[utoipa::path(
    get,
    path = "/api/monitor/health",
    tag = "Monitor",
    summary = "Storage health",
    description = "Database sizes (default), backup recency, or largest relations.",
    params(MonitorParams),
    responses(
        (status = 200, description = "Aggregated envelope", body = serde_json::Value),
    )
)]
pub async fn health_handler(
    State(state): State<AppState>,
    Query(params): Query<MonitorParams>,
) -> Response {
    let selector = params.server.as_deref();
    match health::Section::from_param(params.section.as_deref()) {
        health::Section::Size => {
            Json(state.monitor.fetch(&health::SIZE, selector).await).into_response()
        }
        health::Section::Backups => {
            Json(state.monitor.fetch(&health::BACKUPS, selector).await).into_response()
        }
        health::Section::Files => {
            Json(state.monitor.fetch(&health::FILES, selector).await).into_response()
        }
    }
}

/// Monitor routes, mounted under `/api/monitor`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview_handler))
        .route("/jobs", get(jobs_handler))
        .route("/executions", get(executions_handler))
        .route("/locks", get(locks_handler))
        .route("/performance", get(performance_handler))
        .route("/sessions", get(sessions_handler))
        .route("/health", get(health_handler))
}
