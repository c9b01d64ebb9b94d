use foundation::LngLat;
use stations::{ClusterId, SpatialIndex, StationSnapshot};
use thiserror::Error;
use tracing::{debug, info};

use crate::canvas::CameraCommand;
use crate::config::CameraConfig;

/// Zooms the camera into a cluster when it is activated.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterExpansionController {
    max_zoom: f64,
}

impl Default for ClusterExpansionController {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl ClusterExpansionController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            max_zoom: config.max_zoom,
        }
    }

    /// Fly-to command centered on the cluster at its expansion zoom.
    ///
    /// Returns `None` for ids the index does not know (for example a click
    /// that raced a station refresh).
    pub fn on_cluster_activated(
        &self,
        index: &SpatialIndex,
        id: ClusterId,
    ) -> Option<CameraCommand> {
        let zoom = index.expansion_zoom(id)?;
        let (center, count) = index.cluster(id)?;
        let zoom = (zoom as f64).min(self.max_zoom);
        debug!(cluster = %id, count, zoom, "expanding cluster");
        Some(CameraCommand::FlyTo { center, zoom })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    Denied,
    #[error("location request timed out")]
    Timeout,
    #[error("location unavailable")]
    Unavailable,
}

/// Where the camera starts: the user's position when known, otherwise the
/// configured default station, otherwise the configured default center.
pub fn initial_camera(
    located: Result<LngLat, GeolocationError>,
    stations: &StationSnapshot,
    config: &CameraConfig,
) -> CameraCommand {
    let center = match located {
        Ok(position) if position.is_finite() => position,
        Ok(_) => fallback_center(stations, config),
        Err(err) => {
            info!(%err, "geolocation failed; using default station");
            fallback_center(stations, config)
        }
    };
    CameraCommand::FlyTo {
        center,
        zoom: config.default_zoom,
    }
}

fn fallback_center(stations: &StationSnapshot, config: &CameraConfig) -> LngLat {
    config
        .default_station
        .as_ref()
        .and_then(|id| stations.get(id))
        .map(|s| s.coordinates())
        .unwrap_or(config.default_center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::{LngLatBounds, StationId};
    use pretty_assertions::assert_eq;
    use stations::{ClusterFeature, ClusterOptions, StationRecord};

    fn three_close() -> Vec<StationRecord> {
        vec![
            StationRecord::new("a", LngLat::new(-73.9857, 40.7484)),
            StationRecord::new("b", LngLat::new(-73.9850, 40.7490)),
            StationRecord::new("c", LngLat::new(-73.9862, 40.7479)),
        ]
    }

    #[test]
    fn activation_flies_to_cluster_at_expansion_zoom() {
        let index = SpatialIndex::build(three_close(), ClusterOptions::default());
        let bbox = LngLatBounds::new(-74.05, 40.68, -73.90, 40.82);
        let features = index.query(&bbox, 12);
        let [
            ClusterFeature::Cluster {
                id,
                coordinates,
                point_count: 3,
                expansion_zoom,
            },
        ] = features.as_slice()
        else {
            panic!("expected one cluster of three, got {features:?}");
        };

        let controller = ClusterExpansionController::default();
        let command = controller.on_cluster_activated(&index, *id);
        assert!(*expansion_zoom >= 12);
        assert_eq!(
            command,
            Some(CameraCommand::FlyTo {
                center: *coordinates,
                zoom: f64::from(*expansion_zoom).min(18.0),
            })
        );
    }

    #[test]
    fn zoom_is_clamped_to_configured_max() {
        let index = SpatialIndex::build(three_close(), ClusterOptions::default());
        let features = index.query(&LngLatBounds::WORLD, 3);
        let Some(ClusterFeature::Cluster { id, .. }) = features.first() else {
            panic!("expected a cluster");
        };
        let controller = ClusterExpansionController::new(&CameraConfig {
            max_zoom: 2.0,
            ..CameraConfig::default()
        });
        let Some(CameraCommand::FlyTo { zoom, .. }) = controller.on_cluster_activated(&index, *id)
        else {
            panic!("expected a camera command");
        };
        assert_eq!(zoom, 2.0);
    }

    #[test]
    fn unknown_cluster_yields_no_command() {
        let index = SpatialIndex::build(three_close(), ClusterOptions::default());
        let controller = ClusterExpansionController::default();
        assert_eq!(controller.on_cluster_activated(&index, ClusterId(5)), None);
    }

    #[test]
    fn geolocation_failure_falls_back_to_default_station() {
        let snap = StationSnapshot::from_records(three_close());
        let config = CameraConfig {
            default_station: Some(StationId::new("b")),
            ..CameraConfig::default()
        };
        let command = initial_camera(Err(GeolocationError::Denied), &snap, &config);
        assert_eq!(
            command,
            CameraCommand::FlyTo {
                center: LngLat::new(-73.9850, 40.7490),
                zoom: config.default_zoom,
            }
        );

        let here = LngLat::new(2.35, 48.85);
        let CameraCommand::FlyTo { center, .. } = initial_camera(Ok(here), &snap, &config);
        assert_eq!(center, here);
    }

    #[test]
    fn unknown_default_station_uses_default_center() {
        let config = CameraConfig {
            default_station: Some(StationId::new("missing")),
            ..CameraConfig::default()
        };
        let snapshot = StationSnapshot::default();
        let located = Err(GeolocationError::Timeout);
        let CameraCommand::FlyTo { center, .. } = initial_camera(located, &snapshot, &config);
        assert_eq!(center, config.default_center);
    }
}
