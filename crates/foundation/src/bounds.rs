use serde::{Deserialize, Serialize};

use crate::math::LngLat;

/// Geographic bounding box in degrees.
///
/// `west > east` denotes a box that crosses the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    pub const WORLD: Self = Self::new(-180.0, -85.0, 180.0, 85.0);

    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        LngLatBounds {
            west,
            south,
            east,
            north,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.west.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
            && self.north.is_finite()
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, p: LngLat) -> bool {
        if p.lat < self.south || p.lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            p.lng >= self.west || p.lng <= self.east
        } else {
            p.lng >= self.west && p.lng <= self.east
        }
    }
}
