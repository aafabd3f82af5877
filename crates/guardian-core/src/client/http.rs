//! reqwest-backed implementations of the backend traits.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{AgentBackend, CreateSessionRequest, DataSource, RunRequest, SessionResponse};
use crate::error::{Error, Result};
use crate::types::{RawDisruption, RawNode, RawShipment};

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn trim_base(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Data Backend
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for the supply-chain data backend.
#[derive(Clone)]
pub struct HttpDataSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: trim_base(base_url),
            client: build_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Data request: GET {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch(resource, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::fetch(resource, format!("status {}", status)));
        }

        resp.json()
            .await
            .map_err(|e| Error::fetch(resource, format!("invalid body: {}", e)))
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_shipments(&self) -> Result<Vec<RawShipment>> {
        self.get("shipments", "/shipments").await
    }

    async fn fetch_nodes(&self) -> Result<Vec<RawNode>> {
        self.get("nodes", "/network/nodes").await
    }

    async fn fetch_disruptions(&self) -> Result<Vec<RawDisruption>> {
        self.get("disruptions", "/network/disruptions").await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Backend
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for the agent service.
#[derive(Clone)]
pub struct HttpAgentBackend {
    base_url: String,
    app_name: String,
    client: reqwest::Client,
}

impl HttpAgentBackend {
    pub fn new(
        base_url: impl Into<String>,
        app_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            base_url: trim_base(base_url),
            app_name: app_name.into(),
            client: build_client(timeout)?,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn create_session(&self, user_id: &str) -> Result<SessionResponse> {
        let url = format!(
            "{}/apps/{}/users/{}/sessions",
            self.base_url, self.app_name, user_id
        );
        debug!("Agent request: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(&CreateSessionRequest::default())
            .send()
            .await
            .map_err(|e| Error::Session(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Session(format!("{} - {}", status, text)));
        }

        resp.json()
            .await
            .map_err(|e| Error::Session(format!("invalid session response: {}", e)))
    }

    async fn send_message(&self, user_id: &str, session_id: &str, text: &str) -> Result<Value> {
        let url = format!("{}/run", self.base_url);
        debug!("Agent request: POST {}", url);

        let body = RunRequest::user_text(&self.app_name, user_id, session_id, text);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Send(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Send(format!("{} - {}", status, text)));
        }

        resp.json()
            .await
            .map_err(|e| Error::Send(format!("invalid run response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::refresh::{RefreshOutcome, Refresher};
    use crate::snapshot::SnapshotStore;

    /// `(path, status line, body)`; unknown paths answer 404.
    type Route = (&'static str, &'static str, &'static str);

    /// Minimal HTTP/1.1 server answering each request from a fixed route table.
    async fn serve(routes: &'static [Route]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(answer(socket, routes));
            }
        });

        format!("http://{}", addr)
    }

    async fn answer(mut socket: TcpStream, routes: &'static [Route]) {
        let request = read_request(&mut socket).await;
        let path = request
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/")
            .to_string();

        let (status, body) = routes
            .iter()
            .find(|(p, _, _)| *p == path)
            .map(|(_, status, body)| (*status, *body))
            .unwrap_or(("404 Not Found", "not found"));

        let response = format!(
            "HTTP/1.1 {}\r\n\
             content-type: application/json\r\n\
             content-length: {}\r\n\
             connection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    /// Read headers plus a `content-length` body so the client sees a clean close.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let body_len = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + body_len {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Loopback clients must not pick up proxy settings from the environment.
    fn loopback_client() -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn data_source(base_url: String) -> HttpDataSource {
        HttpDataSource {
            base_url,
            client: loopback_client(),
        }
    }

    fn agent(base_url: String) -> HttpAgentBackend {
        HttpAgentBackend {
            base_url,
            app_name: "supply_agent".to_string(),
            client: loopback_client(),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let data = HttpDataSource::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(data.base_url(), "http://localhost:8000");

        let agent =
            HttpAgentBackend::new("http://localhost:8080//", "supply_agent", Duration::from_secs(1))
                .unwrap();
        assert_eq!(agent.app_name(), "supply_agent");
    }

    #[tokio::test]
    async fn test_session_rejection_maps_to_session_error() {
        static ROUTES: &[Route] = &[(
            "/apps/supply_agent/users/u1/sessions",
            "500 Internal Server Error",
            "boom",
        )];
        let agent = agent(serve(ROUTES).await);

        let err = agent.create_session("u1").await.unwrap_err();
        assert!(matches!(&err, Error::Session(reason) if reason.contains("500")), "{err}");
    }

    #[tokio::test]
    async fn test_session_created_from_response() {
        static ROUTES: &[Route] = &[(
            "/apps/supply_agent/users/u1/sessions",
            "200 OK",
            r#"{"id": "sess-1", "appName": "supply_agent", "userId": "u1"}"#,
        )];
        let agent = agent(serve(ROUTES).await);

        let session = agent.create_session("u1").await.unwrap();
        assert_eq!(session.id, "sess-1");
        assert_eq!(session.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_run_failure_maps_to_send_error() {
        static ROUTES: &[Route] = &[("/run", "502 Bad Gateway", "upstream down")];
        let agent = agent(serve(ROUTES).await);

        let err = agent.send_message("u1", "sess-1", "hello").await.unwrap_err();
        assert!(matches!(&err, Error::Send(reason) if reason.contains("502")), "{err}");
    }

    #[tokio::test]
    async fn test_node_fetch_failure_maps_to_fetch_error() {
        static ROUTES: &[Route] = &[
            ("/shipments", "200 OK", r#"[{"id": "S1", "status": "Delayed"}]"#),
            ("/network/nodes", "500 Internal Server Error", "db down"),
            ("/network/disruptions", "200 OK", "[]"),
        ];
        let data = data_source(serve(ROUTES).await);

        assert_eq!(data.fetch_shipments().await.unwrap().len(), 1);
        assert!(data.fetch_disruptions().await.unwrap().is_empty());

        let err = data.fetch_nodes().await.unwrap_err();
        assert!(
            matches!(
                &err,
                Error::Fetch { resource, reason } if resource == "nodes" && reason.contains("500")
            ),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_refresh_over_http_aborts_when_one_endpoint_fails() {
        static ROUTES: &[Route] = &[
            ("/shipments", "200 OK", r#"[{"id": "S1", "status": "Delayed"}]"#),
            ("/network/nodes", "500 Internal Server Error", "db down"),
            ("/network/disruptions", "200 OK", "[]"),
        ];
        let data = data_source(serve(ROUTES).await);
        let refresher = Refresher::new(Arc::new(data), Arc::new(SnapshotStore::default()));

        let outcome = refresher.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed { error: Error::Fetch { .. }, .. }));
        assert!(refresher.store().get().await.is_none());
    }

    #[tokio::test]
    async fn test_shipments_with_both_field_spellings_decode() {
        static ROUTES: &[Route] = &[(
            "/shipments",
            "200 OK",
            r#"[{"id": "S1", "destination_id": "N2", "destination": "N2",
                 "current_location": {"lat": 1.0, "lon": 2.0},
                 "coordinates": {"lat": 1.0, "lng": 2.0}}]"#,
        )];
        let data = data_source(serve(ROUTES).await);

        let shipments = data.fetch_shipments().await.unwrap();
        assert_eq!(shipments[0].destination_id.as_deref(), Some("N2"));
    }
}
