//! HTTP transport to the aggregation boundary.
//!
//! [`MonitorClient`] fetches one monitor endpoint and decodes the envelope.
//! [`MonitorEndpoint`] binds a client to a fixed `(domain, server, section)`
//! target so the refresh coordinator can poll it; a transport failure is
//! folded into a synthetic envelope attributed to the `client` origin
//! rather than surfacing as an error to the coordinator.

use serde_json::Value;

use super::refresh::Fetcher;
use crate::domain::ResponseEnvelope;
use crate::error::ClientError;

/// Thin HTTP client for the gateway's monitor endpoints.
#[derive(Debug, Clone)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: String,
}

impl MonitorClient {
    /// Creates a client against the given gateway base URL
    /// (e.g. `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches one monitor domain and decodes the response envelope.
    ///
    /// Rows are left as raw JSON values: the envelope shape is fixed but
    /// the row schema varies per `(domain, section)`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the request itself fails
    /// and [`ClientError::Decode`] when the body is not a valid envelope.
    /// Per-server failures are not errors; they arrive inside the envelope.
    pub async fn fetch_envelope(
        &self,
        domain: &str,
        server: Option<&str>,
        section: Option<&str>,
    ) -> Result<ResponseEnvelope<Value>, ClientError> {
        let url = format!("{}/api/monitor/{domain}", self.base_url.trim_end_matches('/'));

        let mut request = self.http.get(&url);
        if let Some(server) = server {
            request = request.query(&[("server", server)]);
        }
        if let Some(section) = section {
            request = request.query(&[("section", section)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        response
            .json::<ResponseEnvelope<Value>>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// One pollable monitor target: a client bound to a domain plus optional
/// server and section selectors.
#[derive(Debug, Clone)]
pub struct MonitorEndpoint {
    client: MonitorClient,
    domain: String,
    server: Option<String>,
    section: Option<String>,
}

impl MonitorEndpoint {
    /// Binds a client to a domain with no selectors (whole fleet, default
    /// section).
    #[must_use]
    pub fn new(client: MonitorClient, domain: impl Into<String>) -> Self {
        Self {
            client,
            domain: domain.into(),
            server: None,
            section: None,
        }
    }

    /// Sets the server selector.
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Sets the section selector.
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}

impl Fetcher for MonitorEndpoint {
    type Output = ResponseEnvelope<Value>;

    async fn fetch(&self) -> Self::Output {
        match self
            .client
            .fetch_envelope(
                &self.domain,
                self.server.as_deref(),
                self.section.as_deref(),
            )
            .await
        {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(domain = %self.domain, error = %err, "monitor fetch failed");
                ResponseEnvelope::client_failure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn fetch_sends_server_and_section_query_params() {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };

        // One-shot HTTP server that records the request line and answers
        // with an empty successful envelope.
        let server = tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                panic!("accept failed");
            };
            let mut buf = vec![0u8; 2048];
            let Ok(n) = socket.read(&mut buf).await else {
                panic!("read failed");
            };
            let request = String::from_utf8_lossy(buf.get(..n).unwrap_or_default()).into_owned();
            let body = r#"{"success":true,"data":[],"timestamp":"2026-01-01T00:00:00Z"}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            request
        });

        let client = MonitorClient::new(format!("http://{addr}"));
        let endpoint = MonitorEndpoint::new(client, "jobs")
            .with_server("db01")
            .with_section("history");
        let envelope = endpoint.fetch().await;
        assert!(envelope.success);

        let Ok(request) = server.await else {
            panic!("server task failed");
        };
        let Some(request_line) = request.lines().next() else {
            panic!("empty request");
        };
        assert!(request_line.contains("/api/monitor/jobs?"));
        assert!(request_line.contains("server=db01"));
        assert!(request_line.contains("section=history"));
    }

    #[tokio::test]
    async fn transport_failure_becomes_client_origin_envelope() {
        // Port 9 (discard) refuses connections; the fetch must fold the
        // transport error into an envelope instead of failing.
        let client = MonitorClient::new("http://127.0.0.1:9");
        let endpoint = MonitorEndpoint::new(client, "overview");

        let envelope = endpoint.fetch().await;
        assert!(!envelope.success);
        assert!(envelope.data.is_empty());
        let Some(errors) = &envelope.errors else {
            panic!("expected a synthetic error");
        };
        assert_eq!(errors.len(), 1);
        let Some(first) = errors.first() else {
            panic!("expected one error");
        };
        assert_eq!(first.server, crate::domain::ErrorOrigin::Client);
    }

    #[test]
    fn endpoint_builder_sets_selectors() {
        let client = MonitorClient::new("http://localhost:3000/");
        let endpoint = MonitorEndpoint::new(client, "jobs")
            .with_server("db01")
            .with_section("history");
        assert_eq!(endpoint.server.as_deref(), Some("db01"));
        assert_eq!(endpoint.section.as_deref(), Some("history"));
    }
}
