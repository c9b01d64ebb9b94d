use std::fmt;

use serde::{Deserialize, Serialize};
use stations::{RouteRole, StationRole};

/// Marker fidelity, chosen from the fractional zoom.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerTier {
    Simple,
    Compact,
    Detailed,
}

/// Zoom thresholds between tiers. Each threshold belongs to the higher tier.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBreakpoints {
    pub compact: f64,
    pub detailed: f64,
}

impl Default for TierBreakpoints {
    fn default() -> Self {
        Self {
            compact: 14.0,
            detailed: 16.0,
        }
    }
}

/// Progressive-disclosure policy: a pure function of zoom.
pub fn marker_tier(zoom: f64, breakpoints: &TierBreakpoints) -> MarkerTier {
    if zoom >= breakpoints.detailed {
        MarkerTier::Detailed
    } else if zoom >= breakpoints.compact {
        MarkerTier::Compact
    } else {
        // NaN lands here too.
        MarkerTier::Simple
    }
}

/// sRGB color.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub mod palette {
    use super::Color;

    pub const MANY_BIKES: Color = Color::rgb(0x2e, 0x7d, 0x32);
    pub const FEW_BIKES: Color = Color::rgb(0xf9, 0xa8, 0x25);
    pub const NO_BIKES: Color = Color::rgb(0xc6, 0x28, 0x28);

    pub const START: Color = Color::rgb(0x1e, 0x88, 0xe5);
    pub const END: Color = Color::rgb(0x8e, 0x24, 0xaa);
    pub const WAYPOINT: Color = Color::rgb(0xfb, 0x8c, 0x00);

    pub const REWARD_A: Color = Color::rgb(0xff, 0xd7, 0x00);
    pub const REWARD_B: Color = Color::rgb(0xc0, 0xc0, 0xc0);
    pub const REWARD_C: Color = Color::rgb(0xcd, 0x7f, 0x32);

    pub const CLUSTER: Color = Color::rgb(0x37, 0x47, 0x4f);
}

/// More than this many bikes counts as "many".
pub const MANY_BIKES_THRESHOLD: u32 = 5;

pub fn availability_color(bikes: u32) -> Color {
    if bikes > MANY_BIKES_THRESHOLD {
        palette::MANY_BIKES
    } else if bikes > 0 {
        palette::FEW_BIKES
    } else {
        palette::NO_BIKES
    }
}

pub fn route_color(route: RouteRole) -> Option<Color> {
    match route {
        RouteRole::Start => Some(palette::START),
        RouteRole::End => Some(palette::END),
        RouteRole::Waypoint => Some(palette::WAYPOINT),
        RouteRole::None => None,
    }
}

/// Role color wins over availability.
pub fn station_color(role: StationRole, bikes: u32) -> Color {
    route_color(role.route).unwrap_or_else(|| availability_color(bikes))
}

pub fn route_letter(route: RouteRole) -> Option<char> {
    match route {
        RouteRole::Start => Some('S'),
        RouteRole::End => Some('E'),
        RouteRole::Waypoint => Some('W'),
        RouteRole::None => None,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RewardTier {
    A,
    B,
    C,
}

pub fn reward_tier(points: u32) -> Option<RewardTier> {
    if points >= 5 {
        Some(RewardTier::A)
    } else if points >= 3 {
        Some(RewardTier::B)
    } else if points > 0 {
        Some(RewardTier::C)
    } else {
        None
    }
}

pub fn reward_color(tier: RewardTier) -> Color {
    match tier {
        RewardTier::A => palette::REWARD_A,
        RewardTier::B => palette::REWARD_B,
        RewardTier::C => palette::REWARD_C,
    }
}

pub const Z_CLUSTER: i32 = 50;
pub const Z_PLAIN: i32 = 100;
pub const Z_WAYPOINT: i32 = 200;
pub const Z_ENDPOINT: i32 = 300;
pub const Z_HOVERED: i32 = 400;

/// Explicit stacking order: hovered > start/end > waypoint > plain.
pub fn z_index(role: StationRole) -> i32 {
    match role.rank() {
        3 => Z_HOVERED,
        2 => Z_ENDPOINT,
        1 => Z_WAYPOINT,
        _ => Z_PLAIN,
    }
}
