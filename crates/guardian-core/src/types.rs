//! Shared types for guardian-core.
//!
//! Canonical entities are what every consumer sees. The `Raw*` records mirror
//! the data backend's wire format and never leave the normalizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// A point in canonical `{lat, lng}` form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical Entities
// ─────────────────────────────────────────────────────────────────────────────

/// Shipment status as reported by the data backend.
///
/// Unknown values are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShipmentStatus {
    InTransit,
    Delayed,
    Stuck,
    Delivered,
    Mitigated,
    Other(String),
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InTransit => "In-Transit",
            Self::Delayed => "Delayed",
            Self::Stuck => "Stuck",
            Self::Delivered => "Delivered",
            Self::Mitigated => "Mitigated",
            Self::Other(s) => s,
        }
    }

    /// Delayed and stuck shipments count toward delay impact and value at risk.
    pub fn is_impacted(&self) -> bool {
        matches!(self, Self::Delayed | Self::Stuck)
    }
}

impl From<String> for ShipmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "In-Transit" => Self::InTransit,
            "Delayed" => Self::Delayed,
            "Stuck" => Self::Stuck,
            "Delivered" => Self::Delivered,
            "Mitigated" => Self::Mitigated,
            _ => Self::Other(s),
        }
    }
}

impl From<ShipmentStatus> for String {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub status: ShipmentStatus,
    pub mode: Option<String>,
    pub priority: Option<String>,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
    pub coordinates: Option<LatLng>,
    pub value_at_risk: f64,
    pub contents: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: Option<String>,
    pub capacity_tier: Option<i64>,
    pub coordinates: Option<LatLng>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disruption {
    pub id: String,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub radius_m: f64,
    pub affected_modes: Vec<String>,
    pub coordinates: Option<LatLng>,
}

/// Entity class, in lookup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Shipment,
    Node,
    Disruption,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Shipment => "shipment",
            Self::Node => "node",
            Self::Disruption => "disruption",
        };
        f.write_str(label)
    }
}

/// One point-in-time bundle of canonical records.
///
/// Snapshots are shared as `Arc<Snapshot>` and never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub shipments: Vec<Shipment>,
    pub disruptions: Vec<Disruption>,
    pub nodes: Vec<Node>,
    pub timestamp: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversation Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One transcript entry. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
}

impl AgentMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Agent, content)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Map View Types
// ─────────────────────────────────────────────────────────────────────────────

/// Zoom applied to coordinate directives that omit one.
pub const DEFAULT_DIRECTIVE_ZOOM: f64 = 5.0;

/// A camera instruction parsed out of an agent reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewDirective {
    ByCoordinates { lat: f64, lng: f64, zoom: f64 },
    ByEntityId { target_id: String },
}

/// The single current map focus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LatLng,
    pub zoom: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw Backend Records
// ─────────────────────────────────────────────────────────────────────────────

/// Shipment as returned by `GET /shipments`.
///
/// Endpoint versions disagree on field names and some send both spellings,
/// so each spelling decodes into its own field. The normalizer prefers the
/// first listed name of each group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawShipment {
    pub id: String,
    pub status: Option<String>,
    pub transport_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub priority: Option<String>,
    pub origin_id: Option<String>,
    pub destination_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub current_location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
    pub contents: Option<Vec<Value>>,
    pub total_value_at_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_at_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Node as returned by `GET /network/nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub capacity_tier: Option<i64>,
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
}

/// Disruption as returned by `GET /network/disruptions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDisruption {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
    pub radius_km: Option<f64>,
    pub radius_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<f64>,
    pub affected_modes: Option<Vec<String>>,
}

/// The three raw collections fetched in one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct RawPayload {
    pub shipments: Vec<RawShipment>,
    pub nodes: Vec<RawNode>,
    pub disruptions: Vec<RawDisruption>,
}
