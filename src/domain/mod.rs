//! Domain layer: server identity, fleet catalog, and the response envelope.
//!
//! These are the types every other layer speaks in: [`ServerKey`] names a
//! monitored server, [`ServerRegistry`] resolves request selectors, and
//! [`ResponseEnvelope`] is the partial-failure-tolerant result of one
//! aggregation call.

pub mod envelope;
pub mod server;

pub use envelope::{AggregationError, ErrorOrigin, ResponseEnvelope, Tagged};
pub use server::{ServerInfo, ServerKey, ServerRegistry};
