//! Snapshot refresh cycle.
//!
//! Each cycle fetches shipments, nodes and disruptions in parallel, normalizes
//! them, and offers the result to the [`SnapshotStore`]. A failure in any of
//! the three fetches discards the whole cycle and the previous snapshot stays
//! in place (last-known-good).
//!
//! Cycles are started by the interval loop and after every completed
//! conversation turn; they may overlap and complete out of order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::client::DataSource;
use crate::error::Error;
use crate::normalize::normalize;
use crate::snapshot::{ReplaceOutcome, SnapshotStore};
use crate::types::RawPayload;

/// What happened to one refresh cycle.
#[derive(Debug)]
pub enum RefreshOutcome {
    Applied { seq: u64 },
    /// Completed after a newer cycle had already been applied.
    Stale { seq: u64, applied: u64 },
    /// A fetch failed; the previous snapshot was kept.
    Failed { seq: u64, error: Error },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Decrements the in-flight counter when a cycle ends, however it ends.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Refresher {
    source: Arc<dyn DataSource>,
    store: Arc<SnapshotStore>,
    in_flight: AtomicUsize,
}

impl Refresher {
    pub fn new(source: Arc<dyn DataSource>, store: Arc<SnapshotStore>) -> Self {
        Self {
            source,
            store,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// True while at least one cycle is fetching.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Run one complete fetch cycle.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.store.begin_cycle();
        let _in_flight = InFlight::enter(&self.in_flight);
        debug!(seq = seq, "Snapshot refresh started");

        let fetched = tokio::try_join!(
            self.source.fetch_shipments(),
            self.source.fetch_nodes(),
            self.source.fetch_disruptions(),
        );

        let (shipments, nodes, disruptions) = match fetched {
            Ok(parts) => parts,
            Err(error) => {
                warn!(
                    seq = seq,
                    error = %error,
                    "Snapshot refresh failed, keeping previous snapshot"
                );
                return RefreshOutcome::Failed { seq, error };
            }
        };

        let snapshot = normalize(
            RawPayload {
                shipments,
                nodes,
                disruptions,
            },
            Utc::now(),
        );
        let counts = (
            snapshot.shipments.len(),
            snapshot.nodes.len(),
            snapshot.disruptions.len(),
        );

        match self.store.replace(seq, snapshot).await {
            ReplaceOutcome::Applied => {
                debug!(
                    seq = seq,
                    shipments = counts.0,
                    nodes = counts.1,
                    disruptions = counts.2,
                    "Snapshot applied"
                );
                RefreshOutcome::Applied { seq }
            }
            ReplaceOutcome::Stale { applied } => {
                debug!(seq = seq, applied = applied, "Snapshot superseded by newer cycle");
                RefreshOutcome::Stale { seq, applied }
            }
        }
    }

    /// Start a cycle in the background.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        let refresher = Arc::clone(self);
        tokio::spawn(async move { refresher.refresh().await })
    }

    /// Refresh every `every`, starting one period from now.
    pub fn spawn_interval(self: Arc<Self>, every: Duration) -> RefreshLoop {
        info!(interval_ms = every.as_millis() as u64, "Starting snapshot refresh loop");

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        });

        RefreshLoop {
            abort_handle: handle.abort_handle(),
        }
    }
}

/// Handle for a running refresh loop. Dropping it stops the loop.
pub struct RefreshLoop {
    abort_handle: AbortHandle,
}

impl RefreshLoop {
    pub fn stop(&self) {
        self.abort_handle.abort();
        info!("Stopped snapshot refresh loop");
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeData;
    use serde_json::json;

    fn refresher(data: Arc<FakeData>) -> Arc<Refresher> {
        Arc::new(Refresher::new(data, Arc::new(SnapshotStore::default())))
    }

    #[tokio::test]
    async fn test_refresh_applies_normalized_snapshot() {
        let data = Arc::new(FakeData::sample());
        let refresher = refresher(data);

        assert!(refresher.refresh().await.is_applied());

        let snapshot = refresher.store().get().await.unwrap();
        assert_eq!(snapshot.shipments.len(), 1);
        assert_eq!(snapshot.disruptions[0].radius_m, 500.0);
        assert!(!refresher.is_refreshing());
    }

    #[tokio::test]
    async fn test_any_fetch_failure_keeps_previous_snapshot() {
        let data = Arc::new(FakeData::sample());
        let refresher = refresher(data.clone());
        refresher.refresh().await;
        let before = refresher.store().get().await.unwrap();

        data.set_fail_nodes(true);
        data.push_shipments(json!([{"id": "S-NEW", "status": "Delayed"}]));
        let outcome = refresher.refresh().await;
        assert!(matches!(outcome, RefreshOutcome::Failed { error: Error::Fetch { .. }, .. }));

        let after = refresher.store().get().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));

        data.set_fail_nodes(false);
        data.push_shipment_failure();
        assert!(!refresher.refresh().await.is_applied());
        assert_eq!(refresher.store().get().await.unwrap().shipments[0].id, "S1");
    }

    #[tokio::test]
    async fn test_failure_before_first_fetch_leaves_store_empty() {
        let data = Arc::new(FakeData::sample());
        data.set_fail_nodes(true);
        let refresher = refresher(data);

        assert!(!refresher.refresh().await.is_applied());
        assert!(refresher.store().get().await.is_none());
    }

    #[tokio::test]
    async fn test_late_older_cycle_does_not_overwrite_newer() {
        let data = Arc::new(FakeData::sample());
        let release_first =
            data.push_gated_shipments(json!([{"id": "FIRST", "status": "Delayed"}]));
        data.push_shipments(json!([{"id": "SECOND", "status": "Delayed"}]));
        let refresher = refresher(data.clone());

        // First-issued cycle starts and blocks inside its fetch.
        let first = refresher.trigger();
        while data.cycles() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(refresher.is_refreshing());

        // Second-issued cycle completes first.
        let second = refresher.refresh().await;
        assert!(matches!(second, RefreshOutcome::Applied { seq: 2 }));

        // First cycle arrives late.
        release_first.send(()).unwrap();
        let first = first.await.unwrap();
        assert!(matches!(first, RefreshOutcome::Stale { seq: 1, applied: 2 }));

        let snapshot = refresher.store().get().await.unwrap();
        assert_eq!(snapshot.shipments[0].id, "SECOND");
    }

    #[tokio::test]
    async fn test_interval_loop_refreshes_until_stopped() {
        let data = Arc::new(FakeData::sample());
        let refresher = refresher(data.clone());

        let handle = Arc::clone(&refresher).spawn_interval(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(55)).await;
        handle.stop();

        let cycles = data.cycles();
        assert!(cycles >= 2, "expected several cycles, got {cycles}");
        assert!(refresher.store().get().await.is_some());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(data.cycles(), cycles);
    }
}
