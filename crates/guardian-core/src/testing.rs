//! In-memory backends for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::client::{AgentBackend, DataSource, SessionResponse};
use crate::error::{Error, Result};
use crate::types::{RawDisruption, RawNode, RawShipment};

/// Agent response steps whose last step carries `text`.
pub fn reply(text: &str) -> Value {
    json!([
        {"content": {"parts": [{"function_call": {"name": "lookup"}}]}},
        {"content": {"parts": [{"text": text}]}}
    ])
}

enum ScriptedReply {
    Steps(Value),
    Fail(String),
    Gated(oneshot::Receiver<()>, Value),
}

pub struct FakeAgent {
    create_calls: AtomicUsize,
    send_calls: AtomicUsize,
    failing_creates: AtomicUsize,
    create_delay: Duration,
    replies: Mutex<VecDeque<ScriptedReply>>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            failing_creates: AtomicUsize::new(0),
            create_delay: Duration::ZERO,
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_create_delay_ms(mut self, ms: u64) -> Self {
        self.create_delay = Duration::from_millis(ms);
        self
    }

    /// The next `n` session creations are rejected.
    pub fn failing_creates(self, n: usize) -> Self {
        self.failing_creates.store(n, Ordering::SeqCst);
        self
    }

    pub fn push_reply(&self, steps: Value) {
        self.replies.lock().unwrap().push_back(ScriptedReply::Steps(steps));
    }

    pub fn push_failure(&self, reason: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Fail(reason.to_string()));
    }

    /// Queue a reply that is held back until the returned sender fires.
    pub fn push_gated_reply(&self, steps: Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.replies
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Gated(rx, steps));
        tx
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentBackend for FakeAgent {
    async fn create_session(&self, user_id: &str) -> Result<SessionResponse> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let failing = self.failing_creates.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_creates.store(failing - 1, Ordering::SeqCst);
            return Err(Error::Session("500 Internal Server Error - boom".to_string()));
        }

        Ok(SessionResponse {
            id: format!("session-{}", n),
            app_name: Some("supply_agent".to_string()),
            user_id: Some(user_id.to_string()),
        })
    }

    async fn send_message(&self, _user_id: &str, _session_id: &str, text: &str) -> Result<Value> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();

        match next {
            Some(ScriptedReply::Steps(steps)) => Ok(steps),
            Some(ScriptedReply::Fail(reason)) => Err(Error::Send(reason)),
            Some(ScriptedReply::Gated(gate, steps)) => {
                let _ = gate.await;
                Ok(steps)
            }
            None => Ok(reply(&format!("echo: {}", text))),
        }
    }
}

enum ScriptedFetch {
    Ready(Vec<RawShipment>),
    Gated(oneshot::Receiver<()>, Vec<RawShipment>),
    Fail,
}

/// Data backend whose shipment list is scripted per cycle.
///
/// Nodes and disruptions are fixed; `fail_nodes` makes every node fetch fail.
pub struct FakeData {
    cycles: AtomicUsize,
    script: Mutex<VecDeque<ScriptedFetch>>,
    default_shipments: Vec<RawShipment>,
    nodes: Vec<RawNode>,
    disruptions: Vec<RawDisruption>,
    fail_nodes: std::sync::atomic::AtomicBool,
}

impl FakeData {
    pub fn new(shipments: Value, nodes: Value, disruptions: Value) -> Self {
        Self {
            cycles: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
            default_shipments: serde_json::from_value(shipments).unwrap(),
            nodes: serde_json::from_value(nodes).unwrap(),
            disruptions: serde_json::from_value(disruptions).unwrap(),
            fail_nodes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// A small network: one located shipment, one port, one storm.
    pub fn sample() -> Self {
        Self::new(
            json!([
                {"id": "S1", "status": "Stuck", "transport_mode": "Sea",
                 "current_location": {"lat": 31.2, "lon": 121.5}, "total_value_at_risk": 5000.0}
            ]),
            json!([
                {"id": "N1", "name": "Port of Rotterdam", "type": "Port",
                 "location": {"lat": 51.95, "lon": 4.14}}
            ]),
            json!([
                {"id": "D1", "type": "Weather", "description": "Typhoon",
                 "location": {"lat": 22.0, "lon": 120.0}, "radius_km": 0.5}
            ]),
        )
    }

    pub fn push_shipments(&self, shipments: Value) {
        let shipments = serde_json::from_value(shipments).unwrap();
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedFetch::Ready(shipments));
    }

    pub fn push_gated_shipments(&self, shipments: Value) -> oneshot::Sender<()> {
        let shipments = serde_json::from_value(shipments).unwrap();
        let (tx, rx) = oneshot::channel();
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedFetch::Gated(rx, shipments));
        tx
    }

    pub fn push_shipment_failure(&self) {
        self.script.lock().unwrap().push_back(ScriptedFetch::Fail);
    }

    pub fn set_fail_nodes(&self, fail: bool) {
        self.fail_nodes.store(fail, Ordering::SeqCst);
    }

    /// Number of shipment fetches started, one per refresh cycle.
    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for FakeData {
    async fn fetch_shipments(&self) -> Result<Vec<RawShipment>> {
        self.cycles.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(ScriptedFetch::Ready(shipments)) => Ok(shipments),
            Some(ScriptedFetch::Gated(gate, shipments)) => {
                let _ = gate.await;
                Ok(shipments)
            }
            Some(ScriptedFetch::Fail) => Err(Error::fetch("shipments", "status 503")),
            None => Ok(self.default_shipments.clone()),
        }
    }

    async fn fetch_nodes(&self) -> Result<Vec<RawNode>> {
        if self.fail_nodes.load(Ordering::SeqCst) {
            return Err(Error::fetch("nodes", "status 500"));
        }
        Ok(self.nodes.clone())
    }

    async fn fetch_disruptions(&self) -> Result<Vec<RawDisruption>> {
        Ok(self.disruptions.clone())
    }
}
