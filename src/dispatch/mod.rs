//! Fan-out execution and result aggregation.
//!
//! [`QueryDispatcher`] runs a probe against many servers concurrently with
//! a wait-for-all barrier; [`aggregator::merge`] folds the per-server
//! outcomes into one [`crate::domain::ResponseEnvelope`].

pub mod aggregator;
pub mod dispatcher;

pub use dispatcher::{Probe, QueryDispatcher, ServerOutcome, SqlProbe};
