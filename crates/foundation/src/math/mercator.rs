use serde::{Deserialize, Serialize};

use super::Vec2;

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;

/// Latitude limit of the Web-Mercator square.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Projects geographic coordinates into unit Web-Mercator space.
///
/// `x` grows eastwards from 0 at -180° to 1 at +180°, `y` grows southwards
/// from 0 at the top of the Mercator square to 1 at the bottom. Latitudes
/// beyond the Mercator limit are clamped onto the square edge.
pub fn project(p: LngLat) -> Vec2 {
    let x = p.lng / 360.0 + 0.5;
    let sin = p.lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / std::f64::consts::PI;
    Vec2::new(x, y.clamp(0.0, 1.0))
}

/// Inverse of [`project`].
pub fn unproject(v: Vec2) -> LngLat {
    let lng = (v.x - 0.5) * 360.0;
    let y2 = (180.0 - v.y * 360.0).to_radians();
    let lat = 360.0 * y2.exp().atan() / std::f64::consts::PI - 90.0;
    LngLat::new(lng, lat)
}

/// Great-circle distance in meters on a sphere of radius `WGS84_A`.
pub fn haversine_m(a: LngLat, b: LngLat) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat * 0.5).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng * 0.5).sin().powi(2);
    2.0 * WGS84_A * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::{LngLat, MERCATOR_MAX_LAT, haversine_m, project, unproject};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_projects_to_center() {
        let v = project(LngLat::new(0.0, 0.0));
        assert_close(v.x, 0.5, 1e-12);
        assert_close(v.y, 0.5, 1e-12);
    }

    #[test]
    fn poles_clamp_to_square_edges() {
        assert_eq!(project(LngLat::new(0.0, 90.0)).y, 0.0);
        assert_eq!(project(LngLat::new(0.0, -90.0)).y, 1.0);
        assert_close(project(LngLat::new(0.0, MERCATOR_MAX_LAT)).y, 0.0, 1e-9);
    }

    #[test]
    fn round_trip_project_unproject() {
        let p = LngLat::new(-73.985_7, 40.748_4);
        let back = unproject(project(p));
        assert_close(back.lng, p.lng, 1e-9);
        assert_close(back.lat, p.lat, 1e-9);
    }

    #[test]
    fn haversine_one_degree_at_equator() {
        let d = haversine_m(LngLat::new(0.0, 0.0), LngLat::new(1.0, 0.0));
        assert_close(d, 111_319.49, 1.0);
    }
}
