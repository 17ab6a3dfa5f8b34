//! fleetmon-gateway server entry point.
//!
//! Starts the Axum HTTP server with the monitor and system endpoints.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fleetmon_gateway::api;
use fleetmon_gateway::app_state::AppState;
use fleetmon_gateway::config::MonitorConfig;
use fleetmon_gateway::domain::ServerRegistry;
use fleetmon_gateway::pool::ConnectionPoolManager;
use fleetmon_gateway::service::MonitorService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = MonitorConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting fleetmon-gateway");

    // Build domain layer
    let registry = ServerRegistry::new(config.server_catalog());
    let pools = Arc::new(ConnectionPoolManager::new(config.servers.clone()));

    // Build service layer
    let monitor = Arc::new(MonitorService::new(pools, registry));

    // Build application state
    let app_state = AppState { monitor };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
