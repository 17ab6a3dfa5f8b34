//! Server identity and the fixed registry of monitored servers.
//!
//! The fleet is a closed set: every monitored server is a [`ServerKey`]
//! variant known at compile time. [`ServerRegistry`] owns the catalog
//! (display metadata plus declaration order) and resolves the optional
//! `?server=` selector into the list of servers a request targets.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identifier of one monitored database server.
///
/// Serialized as its lowercase short name (`"db01"`, `"db02"`), which is
/// also the accepted form of the `?server=` query selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServerKey {
    /// Primary database server.
    Db01,
    /// Secondary database server.
    Db02,
}

impl ServerKey {
    /// All known servers in declaration order.
    ///
    /// This order is the cross-server ordering of every aggregated
    /// response; it never depends on caller input or response latency.
    pub const ALL: [Self; 2] = [Self::Db01, Self::Db02];

    /// Returns the lowercase short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Db01 => "db01",
            Self::Db02 => "db02",
        }
    }

    /// Parses a selector string. Exact match only, no case folding.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "db01" => Some(Self::Db01),
            "db02" => Some(Self::Db02),
            _ => None,
        }
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for one configured server, exposed through
/// `GET /config/servers`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerInfo {
    /// Server identifier.
    pub key: ServerKey,
    /// Human-readable label for the presentation layer.
    pub label: String,
    /// Hostname the gateway connects to.
    pub host: String,
    /// Database name the probes run against.
    pub database: String,
}

/// Static catalog of the monitored fleet.
///
/// Built once at startup from [`crate::config::MonitorConfig`] and read-only
/// afterwards. Selector resolution is forgiving: an unknown server name
/// behaves exactly like an omitted one and resolves to the full fleet.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    servers: Vec<ServerInfo>,
}

impl ServerRegistry {
    /// Creates a registry from the catalog in [`ServerKey::ALL`] order.
    #[must_use]
    pub fn new(mut servers: Vec<ServerInfo>) -> Self {
        servers.sort_by_key(|info| ServerKey::ALL.iter().position(|k| *k == info.key));
        Self { servers }
    }

    /// Resolves an optional selector into the ordered target list.
    ///
    /// A recognized name selects that single server; `None` or an
    /// unrecognized name selects every configured server in declaration
    /// order. Never fails.
    #[must_use]
    pub fn resolve(&self, param: Option<&str>) -> Vec<ServerKey> {
        match param.and_then(ServerKey::parse) {
            Some(key) => vec![key],
            None => self.servers.iter().map(|info| info.key).collect(),
        }
    }

    /// Returns the full catalog in declaration order.
    #[must_use]
    pub fn servers(&self) -> &[ServerInfo] {
        &self.servers
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_registry() -> ServerRegistry {
        ServerRegistry::new(vec![
            ServerInfo {
                key: ServerKey::Db02,
                label: "DB02".to_string(),
                host: "db02.internal".to_string(),
                database: "app".to_string(),
            },
            ServerInfo {
                key: ServerKey::Db01,
                label: "DB01".to_string(),
                host: "db01.internal".to_string(),
                database: "app".to_string(),
            },
        ])
    }

    #[test]
    fn resolve_known_server_selects_one() {
        let registry = make_registry();
        assert_eq!(registry.resolve(Some("db02")), vec![ServerKey::Db02]);
    }

    #[test]
    fn resolve_missing_selector_selects_all_in_declaration_order() {
        let registry = make_registry();
        assert_eq!(registry.resolve(None), vec![ServerKey::Db01, ServerKey::Db02]);
    }

    #[test]
    fn resolve_unknown_selector_behaves_like_missing() {
        let registry = make_registry();
        assert_eq!(registry.resolve(Some("db99")), registry.resolve(None));
    }

    #[test]
    fn resolve_is_case_sensitive() {
        let registry = make_registry();
        // "DB01" is not a known selector, so it falls open to the full fleet.
        assert_eq!(registry.resolve(Some("DB01")), registry.resolve(None));
    }

    #[test]
    fn catalog_is_reordered_to_declaration_order() {
        let registry = make_registry();
        let keys: Vec<ServerKey> = registry.servers().iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![ServerKey::Db01, ServerKey::Db02]);
    }

    #[test]
    fn serde_roundtrip_uses_lowercase() {
        let Ok(json) = serde_json::to_string(&ServerKey::Db01) else {
            panic!("serialize failed");
        };
        assert_eq!(json, "\"db01\"");
    }
}
