use std::fmt;
use std::str::FromStr;

use foundation::{LngLat, StationId};
use serde::{Deserialize, Serialize};

/// Routing preference offered to the rider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteProfile {
    #[default]
    Fastest,
    Safest,
    Scenic,
}

impl RouteProfile {
    pub const ALL: [RouteProfile; 3] = [
        RouteProfile::Fastest,
        RouteProfile::Safest,
        RouteProfile::Scenic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteProfile::Fastest => "fastest",
            RouteProfile::Safest => "safest",
            RouteProfile::Scenic => "scenic",
        }
    }
}

impl fmt::Display for RouteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteProfile::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown route profile `{s}` (expected fastest, safest or scenic)")
            })
    }
}

/// Directions query: `start, waypoints…, end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub coordinates: Vec<LngLat>,
    pub profile: RouteProfile,
}

/// Identity of a route selection. Two requests with equal keys describe the
/// same trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub stops: Vec<StationId>,
    pub profile: RouteProfile,
}

#[cfg(test)]
mod tests {
    use super::RouteProfile;

    #[test]
    fn profiles_parse_case_insensitively() {
        assert_eq!("Safest".parse::<RouteProfile>(), Ok(RouteProfile::Safest));
        assert!("quickest".parse::<RouteProfile>().is_err());
        assert_eq!(RouteProfile::Scenic.to_string(), "scenic");
    }
}
