use foundation::LngLat;
use serde::{Deserialize, Serialize};

/// One turn-by-turn instruction. Forwarded to the navigation panel as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverStep {
    pub instruction: String,
    pub distance_m: f64,
    pub duration_s: f64,
    pub maneuver_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub geometry: Vec<LngLat>,
    pub steps: Vec<ManeuverStep>,
    pub distance_m: f64,
    pub duration_s: f64,
}
