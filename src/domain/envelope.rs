//! Response envelope shared by every monitor endpoint.
//!
//! An aggregation call always produces a well-formed [`ResponseEnvelope`],
//! even when every server failed: partial data and per-server errors travel
//! together, and `success` is simply "no errors were recorded".

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::ServerKey;

/// Where an [`AggregationError`] originated.
///
/// Server-side aggregation only ever produces [`ErrorOrigin::Server`]
/// entries. The [`ErrorOrigin::Client`] sentinel is reserved for the
/// consumer-side transport: when the fetch to the gateway itself fails,
/// no server can be blamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// A specific monitored server failed.
    Server(ServerKey),
    /// The consumer-side fetch to the gateway failed.
    Client,
}

impl Serialize for ErrorOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Server(key) => serializer.serialize_str(key.as_str()),
            Self::Client => serializer.serialize_str("client"),
        }
    }
}

impl<'de> Deserialize<'de> for ErrorOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "client" {
            return Ok(Self::Client);
        }
        ServerKey::parse(&s)
            .map(Self::Server)
            .ok_or_else(|| de::Error::custom(format!("unknown error origin: {s}")))
    }
}

/// One per-server (or client-transport) failure inside an envelope.
///
/// The aggregator records exactly one entry per failed server per call,
/// regardless of how many sub-steps failed underneath.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationError {
    /// Failure origin, serialized as `"db01"` / `"db02"` / `"client"`.
    pub server: ErrorOrigin,
    /// Human-readable failure reason.
    pub message: String,
}

/// A probe row tagged with the server it came from.
///
/// The row's own fields are flattened next to `server`, matching the wire
/// shape consumed by the dashboard tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tagged<R> {
    /// Originating server.
    pub server: ServerKey,
    /// The probe row itself.
    #[serde(flatten)]
    pub row: R,
}

/// The single structured response combining merged data and per-server
/// errors.
///
/// Invariants:
/// - `success == errors.is_none()`
/// - `data` is ordered by requested server order, then by probe row order
///   within each server; the core never re-sorts.
/// - a failed server contributes zero rows and exactly one error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope<R> {
    /// `true` when every targeted server answered.
    pub success: bool,
    /// Merged, server-tagged rows.
    pub data: Vec<Tagged<R>>,
    /// Per-server failures; omitted from the JSON when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<AggregationError>>,
    /// Instant the merge ran, RFC 3339.
    pub timestamp: DateTime<Utc>,
}

impl<R> ResponseEnvelope<R> {
    /// Builds a synthetic envelope for a consumer-side transport failure.
    ///
    /// Carries no data and a single error attributed to the `client`
    /// origin, so the presentation layer renders transport failures the
    /// same way it renders server failures.
    #[must_use]
    pub fn client_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            errors: Some(vec![AggregationError {
                server: ErrorOrigin::Client,
                message: message.into(),
            }]),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct DemoRow {
        value: i64,
    }

    #[test]
    fn tagged_row_flattens_fields() {
        let tagged = Tagged {
            server: ServerKey::Db01,
            row: DemoRow { value: 7 },
        };
        let Ok(json) = serde_json::to_value(&tagged) else {
            panic!("serialize failed");
        };
        assert_eq!(json, serde_json::json!({"server": "db01", "value": 7}));
    }

    #[test]
    fn errors_field_is_omitted_on_success() {
        let envelope = ResponseEnvelope {
            success: true,
            data: vec![Tagged {
                server: ServerKey::Db01,
                row: DemoRow { value: 1 },
            }],
            errors: None,
            timestamp: Utc::now(),
        };
        let Ok(json) = serde_json::to_value(&envelope) else {
            panic!("serialize failed");
        };
        assert!(json.get("errors").is_none());
        assert_eq!(json.get("success"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn client_failure_uses_client_origin() {
        let envelope: ResponseEnvelope<DemoRow> =
            ResponseEnvelope::client_failure("connection refused");
        assert!(!envelope.success);
        assert!(envelope.data.is_empty());
        let Some(errors) = &envelope.errors else {
            panic!("expected errors");
        };
        assert_eq!(errors.len(), 1);
        let Some(first) = errors.first() else {
            panic!("expected one error");
        };
        assert_eq!(first.server, ErrorOrigin::Client);
    }

    #[test]
    fn origin_deserializes_from_wire_strings() {
        let Ok(origin) = serde_json::from_str::<ErrorOrigin>("\"db02\"") else {
            panic!("deserialize failed");
        };
        assert_eq!(origin, ErrorOrigin::Server(ServerKey::Db02));

        let Ok(origin) = serde_json::from_str::<ErrorOrigin>("\"client\"") else {
            panic!("deserialize failed");
        };
        assert_eq!(origin, ErrorOrigin::Client);
    }
}
