//! Headline figures for the dashboard stat cards.

use serde::Serialize;

use crate::types::Snapshot;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotSummary {
    /// All shipments in the snapshot.
    pub active_shipments: usize,
    /// Shipments that are delayed or stuck.
    pub delayed_count: usize,
    /// Summed value at risk of delayed or stuck shipments.
    pub value_at_risk: f64,
    pub disruption_count: usize,
    pub node_count: usize,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        let impacted = snapshot.shipments.iter().filter(|s| s.status.is_impacted());

        let (delayed_count, value_at_risk) = impacted.fold((0usize, 0.0_f64), |(count, value), s| {
            (count + 1, value + s.value_at_risk)
        });

        Self {
            active_shipments: snapshot.shipments.len(),
            delayed_count,
            value_at_risk,
            disruption_count: snapshot.disruptions.len(),
            node_count: snapshot.nodes.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::RawPayload;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_summary_counts_only_impacted_value() {
        let raw = RawPayload {
            shipments: serde_json::from_value(json!([
                {"id": "S1", "status": "Delayed", "total_value_at_risk": 100.0},
                {"id": "S2", "status": "Stuck", "total_value_at_risk": 50.0},
                {"id": "S3", "status": "In-Transit", "total_value_at_risk": 1000.0},
                {"id": "S4", "status": "Stuck"}
            ]))
            .unwrap(),
            nodes: serde_json::from_value(json!([{"id": "N1"}])).unwrap(),
            disruptions: Vec::new(),
        };
        let summary = SnapshotSummary::from(&normalize(raw, Utc::now()));

        assert_eq!(summary.active_shipments, 4);
        assert_eq!(summary.delayed_count, 3);
        assert_eq!(summary.value_at_risk, 150.0);
        assert_eq!(summary.node_count, 1);
        assert_eq!(summary.disruption_count, 0);
    }
}
