// camera.rs — orbit camera around the globe: auto-rotate, damped drag, picking rays

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const FOV_DEG: f32 = 50.0;
const NEAR: f32 = 1.0;
const FAR: f32 = 1000.0;
const WIDE_DISTANCE: f32 = 100.0;
const NARROW_DISTANCE: f32 = 140.0;
/// Surfaces at or below this width pull the camera back.
const NARROW_WIDTH: u32 = 700;
const POLAR_SLACK: f32 = 0.5;

pub struct OrbitCamera {
    /// Angle around +Y, 0 looks down -Z from +Z.
    pub azimuth: f32,
    /// Angle from +Y.
    pub polar: f32,
    pub distance: f32,
    pub aspect: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    dragging: bool,
    delta_azimuth: f32,
    delta_polar: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Whether the ray meets a sphere of `radius` at the origin in front of its start.
    pub fn hits_sphere(&self, radius: f32) -> bool {
        // |o + t d|^2 = r^2 with |d| = 1
        let b = self.origin.dot(self.dir);
        let c = self.origin.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return false;
        }
        -b + disc.sqrt() >= 0.0
    }
}

/// Pointer position in pixels to normalized device coordinates.
pub fn cursor_to_ndc(x: f64, y: f64, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (x / width.max(1) as f64 * 2.0 - 1.0) as f32,
        (-(y / height.max(1) as f64) * 2.0 + 1.0) as f32,
    )
}

impl OrbitCamera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            azimuth: 0.0,
            polar: FRAC_PI_2,
            distance: WIDE_DISTANCE,
            aspect: 1.0,
            auto_rotate: true,
            auto_rotate_speed: -2.0,
            damping: 0.05,
            rotate_speed: 1.0,
            dragging: false,
            delta_azimuth: 0.0,
            delta_polar: 0.0,
        };
        camera.resize(width, height);
        camera
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.distance = if width > NARROW_WIDTH {
            WIDE_DISTANCE
        } else {
            NARROW_DISTANCE
        };
    }

    pub fn min_polar() -> f32 {
        FRAC_PI_2 - POLAR_SLACK
    }

    pub fn max_polar() -> f32 {
        FRAC_PI_2 + POLAR_SLACK
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Queues rotation for a pointer move of (dx, dy) pixels on a surface `height` pixels tall.
    pub fn drag(&mut self, dx: f32, dy: f32, height: u32) {
        let h = height.max(1) as f32;
        self.delta_azimuth -= TAU * dx / h * self.rotate_speed;
        self.delta_polar -= TAU * dy / h * self.rotate_speed;
    }

    /// Per-frame integration of queued rotation with damping.
    pub fn update(&mut self) {
        if self.auto_rotate && !self.dragging {
            // one revolution per 60 s at 60 fps when speed is 1
            self.delta_azimuth -= TAU / 60.0 / 60.0 * self.auto_rotate_speed;
        }

        self.azimuth = (self.azimuth + self.delta_azimuth * self.damping).rem_euclid(TAU);
        self.polar = (self.polar + self.delta_polar * self.damping)
            .clamp(Self::min_polar(), Self::max_polar())
            .clamp(1e-6, PI - 1e-6);

        self.delta_azimuth *= 1.0 - self.damping;
        self.delta_polar *= 1.0 - self.damping;
    }

    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        Vec3::new(sp * sa, cp, sp * ca) * self.distance
    }

    pub fn view_proj(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(FOV_DEG.to_radians(), self.aspect, NEAR, FAR);
        let view = Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y);
        proj * view
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray {
            origin: near,
            dir: (far - near).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::BASE_SPHERE_RADIUS;

    #[test]
    fn starts_on_positive_z() {
        let cam = OrbitCamera::new(1280, 720);
        assert!((cam.eye() - Vec3::new(0.0, 0.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn narrow_surface_backs_off() {
        let mut cam = OrbitCamera::new(1280, 720);
        cam.resize(700, 900);
        assert_eq!(cam.distance, 140.0);
        cam.resize(701, 900);
        assert_eq!(cam.distance, 100.0);
        cam.resize(0, 0);
        assert_eq!(cam.distance, 100.0);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut cam = OrbitCamera::new(1280, 720);
        cam.auto_rotate = false;
        cam.drag(0.0, 10_000.0, 720);
        for _ in 0..200 {
            cam.update();
        }
        assert!((cam.polar - OrbitCamera::min_polar()).abs() < 1e-5);

        cam.drag(0.0, -50_000.0, 720);
        for _ in 0..200 {
            cam.update();
        }
        assert!((cam.polar - OrbitCamera::max_polar()).abs() < 1e-5);
    }

    #[test]
    fn auto_rotate_pauses_while_dragging() {
        let mut cam = OrbitCamera::new(1280, 720);
        cam.set_dragging(true);
        cam.update();
        assert_eq!(cam.azimuth, 0.0);

        cam.set_dragging(false);
        cam.update();
        assert!(cam.azimuth != 0.0);
        assert!((cam.eye().length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn center_ray_hits_globe() {
        let cam = OrbitCamera::new(1280, 720);
        assert!(cam.ray(Vec2::ZERO).hits_sphere(BASE_SPHERE_RADIUS));
        assert!(!cam.ray(Vec2::new(0.95, 0.95)).hits_sphere(BASE_SPHERE_RADIUS));
    }

    #[test]
    fn ndc_mapping() {
        assert_eq!(cursor_to_ndc(0.0, 0.0, 200, 100), Vec2::new(-1.0, 1.0));
        assert_eq!(cursor_to_ndc(200.0, 100.0, 200, 100), Vec2::new(1.0, -1.0));
        assert_eq!(cursor_to_ndc(100.0, 50.0, 200, 100), Vec2::ZERO);
    }

    #[test]
    fn sphere_behind_ray_is_missed() {
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 100.0),
            dir: Vec3::Z,
        };
        assert!(!ray.hits_sphere(19.5));
    }
}
