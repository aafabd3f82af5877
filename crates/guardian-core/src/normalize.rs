//! Raw backend records to canonical entities.
//!
//! The data backend reports locations as `{lat, lon}` objects (sometimes empty,
//! sometimes a free-text string), names the same shipment fields differently
//! across endpoint versions, and measures disruption radius in kilometers.
//! Everything here is a pure transform.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{
    Disruption, LatLng, Node, RawDisruption, RawNode, RawPayload, RawShipment, Shipment,
    ShipmentStatus, Snapshot,
};

const METERS_PER_KM: f64 = 1000.0;

/// Build a snapshot from one complete fetch cycle.
pub fn normalize(raw: RawPayload, timestamp: DateTime<Utc>) -> Snapshot {
    Snapshot {
        shipments: raw.shipments.into_iter().map(normalize_shipment).collect(),
        disruptions: raw.disruptions.into_iter().map(normalize_disruption).collect(),
        nodes: raw.nodes.into_iter().map(normalize_node).collect(),
        timestamp,
    }
}

/// Alternate spellings fill in only where the current field name is absent.
pub fn normalize_shipment(raw: RawShipment) -> Shipment {
    let coordinates = first_coordinates([
        raw.current_location.as_ref(),
        raw.location.as_ref(),
        raw.coordinates.as_ref(),
    ]);

    Shipment {
        coordinates,
        status: ShipmentStatus::from(raw.status.unwrap_or_default()),
        mode: raw.transport_mode.or(raw.mode),
        priority: raw.priority,
        origin_id: raw.origin_id,
        destination_id: raw.destination_id.or(raw.destination),
        value_at_risk: raw
            .total_value_at_risk
            .or(raw.value_at_risk)
            .or(raw.value)
            .unwrap_or(0.0),
        contents: raw.contents.unwrap_or_default(),
        id: raw.id,
    }
}

pub fn normalize_node(raw: RawNode) -> Node {
    Node {
        coordinates: first_coordinates([raw.location.as_ref(), raw.coordinates.as_ref()]),
        name: raw.name.unwrap_or_else(|| raw.id.clone()),
        kind: raw.kind,
        capacity_tier: raw.capacity_tier,
        id: raw.id,
    }
}

pub fn normalize_disruption(raw: RawDisruption) -> Disruption {
    // An explicit meter value wins over the kilometer field.
    let radius_m = match (raw.radius_m.or(raw.radius_meters), raw.radius_km) {
        (Some(m), _) => m,
        (None, Some(km)) => km * METERS_PER_KM,
        (None, None) => 0.0,
    };

    Disruption {
        coordinates: first_coordinates([raw.location.as_ref(), raw.coordinates.as_ref()]),
        kind: raw.kind,
        description: raw.description,
        severity: raw.severity,
        radius_m,
        affected_modes: raw.affected_modes.unwrap_or_default(),
        id: raw.id,
    }
}

/// Extract canonical coordinates from a provider location value.
///
/// Accepts `{lat, lon}` and `{lat, lng}`. Anything else (absent, null, a
/// string, an empty object, non-numeric members) has no coordinates.
pub fn coordinates_from(location: Option<&Value>) -> Option<LatLng> {
    let obj = location?.as_object()?;
    let lat = obj.get("lat")?.as_f64()?;
    let lng = obj
        .get("lng")
        .or_else(|| obj.get("lon"))
        .and_then(Value::as_f64)?;
    Some(LatLng::new(lat, lng))
}

/// Coordinates from the first location value that has them.
fn first_coordinates<'a>(
    candidates: impl IntoIterator<Item = Option<&'a Value>>,
) -> Option<LatLng> {
    candidates.into_iter().find_map(coordinates_from)
}
