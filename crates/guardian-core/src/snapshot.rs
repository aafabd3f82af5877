//! Latest-snapshot store with sequence-guarded replacement.
//!
//! Refresh cycles run concurrently (interval timer and post-turn trigger) and
//! may complete out of order. Each cycle takes a sequence number when it
//! starts; a completed snapshot is applied only if no newer cycle has already
//! been applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::types::{EntityKind, LatLng, Snapshot};

/// Default camera zoom per entity class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomDefaults {
    pub shipment: f64,
    pub node: f64,
    pub disruption: f64,
}

impl Default for ZoomDefaults {
    fn default() -> Self {
        // Shipments closest, disruptions widest (they cover an area).
        Self {
            shipment: 10.0,
            node: 7.0,
            disruption: 5.0,
        }
    }
}

impl ZoomDefaults {
    pub fn for_kind(&self, kind: EntityKind) -> f64 {
        match kind {
            EntityKind::Shipment => self.shipment,
            EntityKind::Node => self.node,
            EntityKind::Disruption => self.disruption,
        }
    }
}

/// Result of an id lookup across entity classes.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMatch {
    pub id: String,
    pub kind: EntityKind,
    pub coordinates: Option<LatLng>,
    pub default_zoom: f64,
}

impl Snapshot {
    /// Find an entity by id: shipments first, then nodes, then disruptions.
    ///
    /// The first class containing the id wins, even if that entity has no
    /// coordinates and a lower-priority one does.
    pub fn find_by_id(&self, id: &str, zoom: &ZoomDefaults) -> Option<EntityMatch> {
        let (kind, coordinates) = if let Some(s) = self.shipments.iter().find(|s| s.id == id) {
            (EntityKind::Shipment, s.coordinates)
        } else if let Some(n) = self.nodes.iter().find(|n| n.id == id) {
            (EntityKind::Node, n.coordinates)
        } else if let Some(d) = self.disruptions.iter().find(|d| d.id == id) {
            (EntityKind::Disruption, d.coordinates)
        } else {
            return None;
        };

        Some(EntityMatch {
            id: id.to_string(),
            kind,
            coordinates,
            default_zoom: zoom.for_kind(kind),
        })
    }
}

/// Outcome of offering a completed snapshot to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied,
    /// A newer cycle was already applied; the snapshot was discarded.
    Stale { applied: u64 },
}

struct Slot {
    snapshot: Option<Arc<Snapshot>>,
    applied_seq: u64,
}

/// Holds the current snapshot.
pub struct SnapshotStore {
    slot: RwLock<Slot>,
    next_seq: AtomicU64,
    zoom: ZoomDefaults,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(ZoomDefaults::default())
    }
}

impl SnapshotStore {
    pub fn new(zoom: ZoomDefaults) -> Self {
        Self {
            slot: RwLock::new(Slot {
                snapshot: None,
                applied_seq: 0,
            }),
            next_seq: AtomicU64::new(1),
            zoom,
        }
    }

    pub fn zoom_defaults(&self) -> &ZoomDefaults {
        &self.zoom
    }

    /// Reserve the sequence number for a fetch cycle that is about to start.
    pub fn begin_cycle(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Swap in a new snapshot produced by cycle `seq`.
    ///
    /// Applying the same sequence number twice is a no-op the second time.
    pub async fn replace(&self, seq: u64, snapshot: Snapshot) -> ReplaceOutcome {
        let mut slot = self.slot.write().await;
        if seq <= slot.applied_seq {
            debug!(
                seq = seq,
                applied = slot.applied_seq,
                "Discarding stale snapshot"
            );
            return ReplaceOutcome::Stale {
                applied: slot.applied_seq,
            };
        }

        slot.snapshot = Some(Arc::new(snapshot));
        slot.applied_seq = seq;
        ReplaceOutcome::Applied
    }

    /// Current snapshot, or `None` before the first successful fetch.
    pub async fn get(&self) -> Option<Arc<Snapshot>> {
        self.slot.read().await.snapshot.clone()
    }

    /// Sequence number of the snapshot currently held (0 if none).
    pub async fn applied_seq(&self) -> u64 {
        self.slot.read().await.applied_seq
    }

    /// Look up an entity in the current snapshot.
    pub async fn find_by_id(&self, id: &str) -> Option<EntityMatch> {
        let snapshot = self.get().await?;
        snapshot.find_by_id(id, &self.zoom)
    }
}
