//! Create-once session ownership.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::client::AgentBackend;
use crate::error::{Error, Result};
use crate::types::Session;

/// Owns the single agent session of this process.
///
/// Concurrent `create_session` calls share one in-flight creation. A failed
/// creation leaves the manager empty so a later, user-initiated call can try
/// again; nothing retries automatically.
pub struct SessionManager {
    backend: Arc<dyn AgentBackend>,
    session: OnceCell<Session>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self {
            backend,
            session: OnceCell::new(),
        }
    }

    /// Create the session, or return the one already created.
    pub async fn create_session(&self, user_id: &str) -> Result<Session> {
        let session = self
            .session
            .get_or_try_init(|| async {
                info!(user_id = %user_id, "Creating agent session");
                let resp = self
                    .backend
                    .create_session(user_id)
                    .await
                    .map_err(|e| match e {
                        Error::Session(reason) => Error::Session(reason),
                        other => Error::Session(other.to_string()),
                    })?;

                info!(session_id = %resp.id, "Agent session created");
                Ok::<_, Error>(Session {
                    id: resp.id,
                    user_id: user_id.to_string(),
                })
            })
            .await;

        if let Err(ref e) = session {
            warn!(error = %e, "Agent session creation failed");
        }
        session.cloned()
    }

    /// The session, if one has been created.
    pub fn current(&self) -> Option<&Session> {
        self.session.get()
    }

    pub fn is_ready(&self) -> bool {
        self.session.initialized()
    }
}
