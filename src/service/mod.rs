//! Service layer: aggregation orchestration.
//!
//! [`MonitorService`] ties selector resolution, fan-out, and merging into
//! the single aggregation call the HTTP handlers invoke.

pub mod monitor_service;

pub use monitor_service::MonitorService;
