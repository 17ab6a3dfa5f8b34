//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Per-server settings use the server's
//! uppercase key as prefix (`DB01_HOST`, `DB02_DATABASE`, ...); credentials
//! and pool bounds are shared across the fleet. Loaded once at startup and
//! immutable for the life of the process.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;

use crate::domain::{ServerInfo, ServerKey};

/// Connection parameters for one monitored server.
///
/// One instance exists per [`ServerKey`]; the pool manager builds every
/// replacement pool from the same immutable config.
#[derive(Debug, Clone)]
pub struct ServerConnectionConfig {
    /// Hostname of the PostgreSQL server.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Database the probes run against.
    pub database: String,
    /// Login user, shared fleet-wide.
    pub user: String,
    /// Login password, shared fleet-wide.
    pub password: String,
    /// Upper pool bound.
    pub max_connections: u32,
    /// Lower pool bound.
    pub min_connections: u32,
    /// Idle connections are reaped after this many seconds.
    pub idle_timeout_secs: u64,
    /// Per-probe execution bound in seconds.
    pub request_timeout_secs: u64,
}

impl ServerConnectionConfig {
    /// Builds driver connect options from this config.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }

    /// The per-probe execution bound as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The idle-connection reap bound as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`MonitorConfig::from_env`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,
    /// Per-server connection parameters, one entry per configured key.
    pub servers: HashMap<ServerKey, ServerConnectionConfig>,
}

impl MonitorConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Pool bounds and ports fall back to defaults; hosts, database names,
    /// and credentials are required.
    ///
    /// # Errors
    ///
    /// Returns an error when `LISTEN_ADDR` cannot be parsed or a required
    /// variable (`DBxx_HOST`, `DBxx_DATABASE`, `DB_USER`, `DB_PASSWORD`)
    /// is missing.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("invalid LISTEN_ADDR")?;

        let user = require_env("DB_USER")?;
        let password = require_env("DB_PASSWORD")?;
        let shared_port: u16 = parse_env("DB_PORT", 5432);

        let max_connections = parse_env("DB_MAX_CONNECTIONS", 10);
        let min_connections = parse_env("DB_MIN_CONNECTIONS", 0);
        let idle_timeout_secs = parse_env("DB_IDLE_TIMEOUT_SECS", 30);
        let request_timeout_secs = parse_env("DB_REQUEST_TIMEOUT_SECS", 30);

        let mut servers = HashMap::new();
        for key in ServerKey::ALL {
            let prefix = key.as_str().to_uppercase();
            let host = require_env(&format!("{prefix}_HOST"))?;
            let database = require_env(&format!("{prefix}_DATABASE"))?;
            let port = parse_env(&format!("{prefix}_PORT"), shared_port);

            servers.insert(
                key,
                ServerConnectionConfig {
                    host,
                    port,
                    database,
                    user: user.clone(),
                    password: password.clone(),
                    max_connections,
                    min_connections,
                    idle_timeout_secs,
                    request_timeout_secs,
                },
            );
        }

        Ok(Self {
            listen_addr,
            servers,
        })
    }

    /// Builds the display catalog for [`crate::domain::ServerRegistry`].
    #[must_use]
    pub fn server_catalog(&self) -> Vec<ServerInfo> {
        ServerKey::ALL
            .iter()
            .filter_map(|key| {
                self.servers.get(key).map(|cfg| ServerInfo {
                    key: *key,
                    label: key.as_str().to_uppercase(),
                    host: cfg.host.clone(),
                    database: cfg.database.clone(),
                })
            })
            .collect()
    }
}

/// Reads a required environment variable.
fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("missing required environment variable {key}"))
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
