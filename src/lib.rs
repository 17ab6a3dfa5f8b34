//! # fleetmon-gateway
//!
//! REST aggregation gateway for monitoring a fleet of PostgreSQL servers.
//!
//! Every monitor endpoint runs the same telemetry query against each
//! selected server in parallel and merges the per-server results into a
//! single envelope. A server being down degrades the response instead of
//! failing it: its rows are absent and a per-server error entry takes
//! their place.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, RefreshCoordinator)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── MonitorService (service/)
//!     │     ├── ServerRegistry (domain/)
//!     │     ├── QueryDispatcher + aggregator (dispatch/)
//!     │     └── Probes (probes/)
//!     │
//!     └── ConnectionPoolManager (pool/)
//!           └── PostgreSQL fleet
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod pool;
pub mod probes;
pub mod service;
