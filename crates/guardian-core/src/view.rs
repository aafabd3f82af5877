//! Directive to camera resolution.

use thiserror::Error;

use crate::snapshot::ZoomDefaults;
use crate::types::{CameraState, LatLng, Snapshot, ViewDirective};

/// An entity directive that could not be placed on the map.
///
/// Advisory only: the camera stays where it is and the user is not told.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionMiss {
    #[error("no snapshot has been loaded yet")]
    NoSnapshot,

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("entity has no coordinates: {0}")]
    NoCoordinates(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewResolver {
    zoom: ZoomDefaults,
}

impl ViewResolver {
    pub fn new(zoom: ZoomDefaults) -> Self {
        Self { zoom }
    }

    /// Turn a directive into a camera target.
    ///
    /// `snapshot` must be the latest committed snapshot at the moment of the
    /// call. Coordinate directives ignore it entirely.
    pub fn resolve(
        &self,
        directive: &ViewDirective,
        snapshot: Option<&Snapshot>,
    ) -> Result<CameraState, ResolutionMiss> {
        match directive {
            ViewDirective::ByCoordinates { lat, lng, zoom } => Ok(CameraState {
                center: LatLng::new(*lat, *lng),
                zoom: *zoom,
            }),
            ViewDirective::ByEntityId { target_id } => {
                let snapshot = snapshot.ok_or(ResolutionMiss::NoSnapshot)?;
                let found = snapshot
                    .find_by_id(target_id, &self.zoom)
                    .ok_or_else(|| ResolutionMiss::NotFound(target_id.clone()))?;
                let center = found
                    .coordinates
                    .ok_or_else(|| ResolutionMiss::NoCoordinates(target_id.clone()))?;

                Ok(CameraState {
                    center,
                    zoom: found.default_zoom,
                })
            }
        }
    }
}
