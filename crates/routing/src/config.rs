use serde::{Deserialize, Serialize};

use crate::request::RouteProfile;

/// Backend profile name used for each rider-facing profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileNames {
    pub fastest: String,
    pub safest: String,
    pub scenic: String,
}

impl Default for ProfileNames {
    fn default() -> Self {
        Self {
            fastest: "bike".to_string(),
            safest: "bike".to_string(),
            scenic: "bike".to_string(),
        }
    }
}

impl ProfileNames {
    pub fn get(&self, profile: RouteProfile) -> &str {
        match profile {
            RouteProfile::Fastest => &self.fastest,
            RouteProfile::Safest => &self.safest,
            RouteProfile::Scenic => &self.scenic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// OSRM-compatible directions endpoint, without trailing slash.
    pub base_url: String,
    pub timeout_ms: u64,
    pub profiles: ProfileNames,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            timeout_ms: 10_000,
            profiles: ProfileNames::default(),
        }
    }
}
