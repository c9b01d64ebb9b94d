use serde::Serialize;

use crate::symbology::{Color, MarkerTier};

/// Outer pixel size of a marker container.
///
/// The map engine caches anchor offsets per marker object, so a container
/// keeps these dimensions for as long as its (tier, role) pair is unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
}

impl ContainerSize {
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

pub const SIMPLE_PLAIN: ContainerSize = ContainerSize::square(12);
pub const SIMPLE_ROUTE: ContainerSize = ContainerSize::square(18);
pub const COMPACT_PLAIN: ContainerSize = ContainerSize::new(50, 32);
pub const COMPACT_ROUTE: ContainerSize = ContainerSize::square(24);
pub const DETAILED_PLAIN: ContainerSize = ContainerSize::new(104, 56);
pub const DETAILED_ROUTE: ContainerSize = ContainerSize::square(30);

/// Fixed container size for a (tier, role) pair.
pub fn container_size(tier: MarkerTier, is_route: bool) -> ContainerSize {
    match (tier, is_route) {
        (MarkerTier::Simple, false) => SIMPLE_PLAIN,
        (MarkerTier::Simple, true) => SIMPLE_ROUTE,
        (MarkerTier::Compact, false) => COMPACT_PLAIN,
        (MarkerTier::Compact, true) => COMPACT_ROUTE,
        (MarkerTier::Detailed, false) => DETAILED_PLAIN,
        (MarkerTier::Detailed, true) => DETAILED_ROUTE,
    }
}

/// Cluster bubble diameter by count bucket.
pub fn cluster_diameter(count: u32) -> u32 {
    if count < 10 {
        30
    } else if count < 100 {
        38
    } else {
        46
    }
}

/// Availability glyph shown in the compact info box.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Lightning,
    Bike,
    EmptySet,
}

/// Reward badge of a detailed card.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardBadge {
    /// Pickup and dropoff offer the same points.
    Combined { points: u32 },
    Directional { pickup: u32, dropoff: u32 },
}

/// Inner body drawn inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerBody {
    Circle {
        color: Color,
        diameter: u32,
        label: Option<char>,
    },
    InfoBox {
        bikes: u32,
        glyph: Glyph,
        color: Color,
        /// Reward-tier top border.
        border: Option<Color>,
    },
    Card {
        badge: Option<RewardBadge>,
        classic: u32,
        ebikes: u32,
        docks: u32,
        accent: Color,
    },
    Cluster {
        count: u32,
        label: String,
        diameter: u32,
        color: Color,
    },
}

/// Visual content of one marker: a fixed-size container plus its body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerContent {
    pub size: ContainerSize,
    pub body: MarkerBody,
}

/// Presentation attributes that never touch container dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub struct MarkerAppearance {
    pub z_index: i32,
    /// Hover growth, applied as a transform.
    pub grow_px: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_circles_are_larger_than_plain_at_simple_tier() {
        let route = container_size(MarkerTier::Simple, true);
        assert!(route.width > SIMPLE_PLAIN.width);
    }

    #[test]
    fn container_table() {
        assert_eq!(
            container_size(MarkerTier::Compact, false),
            ContainerSize::new(50, 32)
        );
        assert_eq!(
            container_size(MarkerTier::Detailed, false),
            ContainerSize::new(104, 56)
        );
        assert_eq!(
            container_size(MarkerTier::Detailed, true),
            ContainerSize::square(30)
        );
    }

    #[test]
    fn cluster_buckets() {
        assert_eq!(cluster_diameter(9), 30);
        assert_eq!(cluster_diameter(10), 38);
        assert_eq!(cluster_diameter(99), 38);
        assert_eq!(cluster_diameter(100), 46);
    }
}
