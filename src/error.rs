//! Error types for the aggregation core and the consumer-side client.
//!
//! [`MonitorError`] is the single per-server error channel: pool
//! acquisition failures and probe execution failures both fold into it, so
//! the aggregator (and the envelope consumer) never has to distinguish
//! them. Per-server errors are recorded in the envelope, never raised.

use std::time::Duration;

/// A per-server failure during one aggregation call.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The server could not be reached or authenticated.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server accepted the connection but rejected or failed the probe.
    #[error("probe failed: {0}")]
    Probe(String),

    /// The probe did not finish within the configured per-request timeout.
    #[error("timeout after {0}s")]
    Timeout(u64),

    /// A scalar probe returned no row where exactly one was required.
    ///
    /// Surfaced instead of zero-filling the missing value, so an empty
    /// result is visible as a failure rather than a silent all-zeros row.
    #[error("probe returned no rows")]
    EmptyResult,
}

impl MonitorError {
    /// Folds a driver error into the per-server error channel.
    ///
    /// Transport-shaped failures become [`MonitorError::Connection`] so the
    /// pool manager can retire the pool; everything else is a
    /// [`MonitorError::Probe`].
    #[must_use]
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::EmptyResult,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Protocol(_) => Self::Connection(err.to_string()),
            other => Self::Probe(other.to_string()),
        }
    }

    /// Builds a timeout error from the configured per-request bound.
    #[must_use]
    pub fn timed_out(limit: Duration) -> Self {
        Self::Timeout(limit.as_secs())
    }

    /// `true` when the failure indicates the connection itself is gone and
    /// the pool should be replaced on the next acquisition.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// A consumer-side failure reaching or decoding the gateway response.
///
/// Unlike [`MonitorError`], this is not attributable to any monitored
/// server; the refresh layer converts it into a synthetic envelope with a
/// single `client`-origin error entry.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request to the gateway failed outright.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered but the body was not a valid envelope.
    #[error("invalid response body: {0}")]
    Decode(String),
}
