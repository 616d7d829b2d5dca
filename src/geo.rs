// Lat/lon to sphere coordinates

use glam::{DVec3, Vec3};
use serde::Deserialize;
use std::f64::consts::PI;

/// Geographic position in degrees on a perfect sphere.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn to_cartesian(self, radius: f64) -> DVec3 {
        to_cartesian(self.lat, self.lon, radius)
    }
}

/// Projects (lat, lon) onto a sphere of `radius` centred at the origin.
///
/// +Y is the north pole; lon = 0 lands on +X, lon = ±180 on -X.
pub fn to_cartesian(lat: f64, lon: f64, radius: f64) -> DVec3 {
    let phi = (90.0 - lat) * PI / 180.0;
    let theta = (lon + 180.0) * PI / 180.0;

    DVec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Unit-length direction for (lat, lon), in render precision.
pub fn to_unit_direction(lat: f64, lon: f64) -> Vec3 {
    to_cartesian(lat, lon, 1.0).normalize().as_vec3()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_matches_radius() {
        for lat in [-90.0, 0.0, 90.0] {
            for lon in [-180.0, 0.0, 180.0] {
                let p = to_cartesian(lat, lon, 20.0);
                assert!((p.length() - 20.0).abs() < 1e-9, "lat={lat} lon={lon} p={p:?}");
            }
        }
    }

    #[test]
    fn antimeridian_is_periodic() {
        for lat in [-45.0, 0.0, 33.3, 89.0] {
            let a = to_cartesian(lat, -180.0, 7.5);
            let b = to_cartesian(lat, 180.0, 7.5);
            assert!((a - b).length() < 1e-9, "a={a:?} b={b:?}");
        }
    }

    #[test]
    fn poles_collapse_onto_y_axis() {
        let north = to_cartesian(90.0, 123.0, 20.0);
        let south = to_cartesian(-90.0, -45.0, 20.0);
        assert!(north.x.abs() < 1e-9 && north.z.abs() < 1e-9);
        assert!((north.y - 20.0).abs() < 1e-9);
        assert!((south.y + 20.0).abs() < 1e-9);
    }

    #[test]
    fn prime_meridian_faces_positive_x() {
        let p = to_cartesian(0.0, 0.0, 1.0);
        assert!((p - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-12);
        let p = GeoPoint::new(0.0, 90.0).to_cartesian(1.0);
        assert!((p - DVec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    }
}
