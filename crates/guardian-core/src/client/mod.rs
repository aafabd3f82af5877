//! Backend clients.
//!
//! The core talks to two external services through injected trait objects:
//!
//! - [`DataSource`]: the supply-chain data backend (shipments, nodes, disruptions)
//! - [`AgentBackend`]: the conversational agent (sessions, message runs)
//!
//! HTTP implementations live in [`http`]; tests substitute in-memory fakes.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use guardian_core::client::{DataSource, HttpDataSource};
//!
//! #[tokio::main]
//! async fn main() -> guardian_core::Result<()> {
//!     let data = HttpDataSource::new("http://localhost:8000", Duration::from_secs(10))?;
//!     let shipments = data.fetch_shipments().await?;
//!     println!("{} shipments", shipments.len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{RawDisruption, RawNode, RawShipment};

#[cfg(feature = "client")]
mod http;

#[cfg(feature = "client")]
pub use http::{HttpAgentBackend, HttpDataSource};

/// Source of raw network records.
///
/// Any failure must surface as [`crate::Error::Fetch`] so the refresh cycle can
/// discard the whole batch.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_shipments(&self) -> Result<Vec<RawShipment>>;

    async fn fetch_nodes(&self) -> Result<Vec<RawNode>>;

    async fn fetch_disruptions(&self) -> Result<Vec<RawDisruption>>;
}

/// The conversational agent service.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Create a session for `user_id`. Rejections map to [`crate::Error::Session`].
    async fn create_session(&self, user_id: &str) -> Result<SessionResponse>;

    /// Run one user message and return the raw list of response steps.
    ///
    /// Failures map to [`crate::Error::Send`].
    async fn send_message(&self, user_id: &str, session_id: &str, text: &str) -> Result<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent Wire Types
// ─────────────────────────────────────────────────────────────────────────────

/// Create session request
#[derive(Debug, Default, Serialize)]
pub struct CreateSessionRequest {
    pub state: serde_json::Map<String, Value>,
}

/// Create session response
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    #[serde(default, rename = "appName")]
    pub app_name: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// Message run request
#[derive(Debug, Serialize)]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: MessageContent,
    pub streaming: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageContent {
    pub role: String,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Serialize)]
pub struct MessagePart {
    pub text: String,
}

impl RunRequest {
    pub fn user_text(app_name: &str, user_id: &str, session_id: &str, text: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            new_message: MessageContent {
                role: "user".to_string(),
                parts: vec![MessagePart {
                    text: text.to_string(),
                }],
            },
            streaming: false,
        }
    }
}

/// Reply text of a run: the last step's `content.parts[0].text`.
///
/// Returns `None` for anything that does not have that shape, including an
/// empty string.
pub fn reply_text(steps: &Value) -> Option<&str> {
    steps
        .as_array()?
        .last()?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|t| !t.is_empty())
}
