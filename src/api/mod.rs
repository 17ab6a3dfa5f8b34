//! REST API layer: route handlers, request DTOs, router composition, and
//! the OpenAPI document.
//!
//! Monitor endpoints are mounted under `/api/monitor`; system endpoints
//! (liveness, server catalog) at the root. With the `swagger-ui` feature
//! enabled the interactive documentation is served at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;
#[cfg(feature = "swagger-ui")]
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "fleetmon-gateway API",
        description = "Aggregated telemetry from a fleet of PostgreSQL servers"
    ),
    paths(
        handlers::monitor::overview_handler,
        handlers::monitor::jobs_handler,
        handlers::monitor::executions_handler,
        handlers::monitor::locks_handler,
        handlers::monitor::performance_handler,
        handlers::monitor::sessions_handler,
        handlers::monitor::health_handler,
        handlers::system::liveness_handler,
        handlers::system::servers_handler,
    ),
    components(schemas(
        handlers::system::LivenessResponse,
        crate::domain::ServerInfo,
        crate::domain::ServerKey,
    )),
    tags(
        (name = "Monitor", description = "Aggregated fleet telemetry"),
        (name = "System", description = "Gateway liveness and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
#[must_use]
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/monitor", handlers::monitor::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    router
}
