//! Conversation turns and map focus.
//!
//! ```text
//! Turn cycle                          Refresh cycle (independent)
//!
//!   Idle ──send_message──► AwaitingReply      RefreshIdle ──tick / turn done──► Refreshing
//!    ▲                          │                  ▲                                │
//!    └──── reply / failure ─────┘                  └────────── applied / failed ────┘
//! ```
//!
//! A turn appends the user message, calls the agent, strips any view
//! directive out of the reply, moves the camera if the directive resolves
//! against the latest snapshot, appends the agent message and triggers a
//! snapshot refresh. Only one turn may be in flight; overlapping calls are
//! rejected rather than queued so the transcript never interleaves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{AgentBackend, reply_text};
use crate::directive::{DirectiveIssue, DirectiveParser};
use crate::error::Result;
use crate::refresh::{RefreshOutcome, Refresher};
use crate::session::SessionManager;
use crate::types::{
    AgentMessage, CameraState, DEFAULT_DIRECTIVE_ZOOM, Role, Session, Snapshot, ViewDirective,
};
use crate::view::ViewResolver;

pub const DEFAULT_GREETING: &str =
    "I am the **Supply Chain Guardian**. I have analyzed the current network state.";

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub user_id: String,
    /// Appended once as the first agent message after the session is created.
    pub greeting: Option<String>,
    /// Zoom for coordinate directives that omit one.
    pub directive_zoom: f64,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            user_id: "user_default".to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            directive_zoom: DEFAULT_DIRECTIVE_ZOOM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingReply,
}

/// Result of one `send_message` call.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Blank input.
    Ignored,
    /// No session yet (or session creation failed).
    NoSession,
    /// Another turn is awaiting its reply.
    Busy,
    /// The agent answered without extractable text.
    Silent,
    Replied {
        message: AgentMessage,
        /// New camera, if the reply carried a directive that resolved.
        camera: Option<CameraState>,
        /// The post-turn snapshot refresh.
        refresh: JoinHandle<RefreshOutcome>,
    },
    /// The agent call failed; an error message was appended.
    Failed { message: AgentMessage },
}

/// Outcome of the concurrent start-up work.
#[derive(Debug)]
pub struct InitReport {
    pub session: Result<Session>,
    pub refresh: RefreshOutcome,
}

/// Holds the awaiting flag for the duration of one turn.
struct TurnGuard<'a>(&'a AtomicBool);

impl<'a> TurnGuard<'a> {
    fn try_enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ConversationController {
    agent: Arc<dyn AgentBackend>,
    sessions: SessionManager,
    refresher: Arc<Refresher>,
    parser: DirectiveParser,
    resolver: ViewResolver,
    options: ControllerOptions,
    transcript: RwLock<Vec<AgentMessage>>,
    camera: RwLock<Option<CameraState>>,
    awaiting: AtomicBool,
    greeted: AtomicBool,
    session_failure_reported: AtomicBool,
}

impl ConversationController {
    pub fn new(
        agent: Arc<dyn AgentBackend>,
        refresher: Arc<Refresher>,
        options: ControllerOptions,
    ) -> Self {
        let resolver = ViewResolver::new(*refresher.store().zoom_defaults());
        Self {
            sessions: SessionManager::new(Arc::clone(&agent)),
            agent,
            refresher,
            parser: DirectiveParser::new(options.directive_zoom),
            resolver,
            options,
            transcript: RwLock::new(Vec::new()),
            camera: RwLock::new(None),
            awaiting: AtomicBool::new(false),
            greeted: AtomicBool::new(false),
            session_failure_reported: AtomicBool::new(false),
        }
    }

    /// Create the session and load the first snapshot concurrently.
    pub async fn initialize(&self) -> InitReport {
        let (session, refresh) = tokio::join!(self.start_session(), self.refresher.refresh());
        InitReport { session, refresh }
    }

    /// Create the agent session if it does not exist yet.
    ///
    /// The first failure is reported in the transcript; later failures are
    /// only logged.
    pub async fn start_session(&self) -> Result<Session> {
        match self.sessions.create_session(&self.options.user_id).await {
            Ok(session) => {
                if let Some(greeting) = &self.options.greeting {
                    if !self.greeted.swap(true, Ordering::SeqCst) {
                        self.append(AgentMessage::new(Role::Agent, greeting.clone()))
                            .await;
                    }
                }
                Ok(session)
            }
            Err(e) => {
                if !self.session_failure_reported.swap(true, Ordering::SeqCst) {
                    self.append(AgentMessage::error(format!(
                        "Agent unavailable: {}. Reload to try again.",
                        e
                    )))
                    .await;
                }
                Err(e)
            }
        }
    }

    /// Send one user message and process the reply.
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Ignored;
        }
        let Some(session) = self.sessions.current().cloned() else {
            debug!("Message dropped, no agent session");
            return TurnOutcome::NoSession;
        };
        let Some(_turn) = TurnGuard::try_enter(&self.awaiting) else {
            debug!("Message rejected, a reply is still pending");
            return TurnOutcome::Busy;
        };

        self.append(AgentMessage::new(Role::User, text)).await;

        let steps = match self
            .agent
            .send_message(&session.user_id, &session.id, text)
            .await
        {
            Ok(steps) => steps,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Agent turn failed");
                let message = AgentMessage::error(format!("Error: {}", e));
                self.append(message.clone()).await;
                return TurnOutcome::Failed { message };
            }
        };

        let Some(reply) = reply_text(&steps) else {
            debug!(session_id = %session.id, "Agent reply carried no text");
            return TurnOutcome::Silent;
        };

        let parsed = self.parser.parse(reply);
        match &parsed.issue {
            Some(issue @ DirectiveIssue::InvalidJson(_)) => {
                warn!(error = %issue, "View directive left in reply")
            }
            Some(issue) => debug!(error = %issue, "View directive discarded"),
            None => {}
        }

        let camera = match &parsed.directive {
            Some(directive) => self.apply_directive(directive).await,
            None => None,
        };

        let message = AgentMessage::new(Role::Agent, parsed.text);
        self.append(message.clone()).await;

        let refresh = self.refresher.trigger();
        TurnOutcome::Replied {
            message,
            camera,
            refresh,
        }
    }

    /// Resolve against the snapshot committed right now and move the camera.
    async fn apply_directive(&self, directive: &ViewDirective) -> Option<CameraState> {
        let snapshot = self.refresher.store().get().await;
        match self.resolver.resolve(directive, snapshot.as_deref()) {
            Ok(camera) => {
                info!(center = %camera.center, zoom = camera.zoom, "Camera moved");
                *self.camera.write().await = Some(camera);
                Some(camera)
            }
            Err(miss) => {
                debug!(reason = %miss, "View directive not resolved, camera unchanged");
                None
            }
        }
    }

    async fn append(&self, message: AgentMessage) {
        self.transcript.write().await.push(message);
    }

    pub async fn transcript(&self) -> Vec<AgentMessage> {
        self.transcript.read().await.clone()
    }

    pub async fn camera(&self) -> Option<CameraState> {
        *self.camera.read().await
    }

    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.refresher.store().get().await
    }

    pub fn session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    pub fn turn_state(&self) -> TurnState {
        if self.awaiting.load(Ordering::SeqCst) {
            TurnState::AwaitingReply
        } else {
            TurnState::Idle
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.turn_state() == TurnState::AwaitingReply
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.is_refreshing()
    }

    pub fn refresher(&self) -> &Arc<Refresher> {
        &self.refresher
    }
}
