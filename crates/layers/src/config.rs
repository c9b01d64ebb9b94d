use foundation::{LngLat, StationId};
use serde::{Deserialize, Serialize};
use stations::ClusterOptions;

use crate::symbology::TierBreakpoints;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub breakpoints: TierBreakpoints,
    /// Extra pixels a hovered marker grows by.
    pub hover_growth_px: u32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            breakpoints: TierBreakpoints::default(),
            hover_growth_px: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Upper bound for cluster fly-to zooms.
    pub max_zoom: f64,
    /// Station to center on when the user's location is unavailable.
    pub default_station: Option<StationId>,
    /// Used when `default_station` is unset or unknown.
    pub default_center: LngLat,
    pub default_zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            max_zoom: 18.0,
            default_station: None,
            default_center: LngLat::new(-73.9857, 40.7484),
            default_zoom: 15.0,
        }
    }
}

/// Everything the station layer reads from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub clustering: ClusterOptions,
    pub markers: MarkerConfig,
    pub camera: CameraConfig,
}
