// dots.rs — dot field sampled from the visibility index

use crate::animation::{MaterialId, UniformArena, UniformSet};
use crate::geo;
use crate::map::VisibilityIndex;
use glam::{Mat3, Quat, Vec3};
use rand::Rng;
use std::f64::consts::PI;

/// Radius of the sphere the dots sit on.
pub const DOT_SPHERE_RADIUS: f64 = 20.0;
/// Dots per unit of ring circumference.
pub const DOT_DENSITY: f64 = 2.5;

#[derive(Debug, Clone, Copy)]
pub struct Dot {
    pub position: Vec3,
    /// Rotates the disc's local +Z onto the outward normal.
    pub rotation: Quat,
    pub material: MaterialId,
}

#[derive(Debug, Clone, Default)]
pub struct DotField {
    pub dots: Vec<Dot>,
}

/// Number of evenly spaced samples on the latitude ring `lat`.
pub fn dots_for_lat(lat: i32) -> usize {
    let radius = (f64::from(lat.abs()) * PI / 180.0).cos() * DOT_SPHERE_RADIUS;
    let circumference = radius * PI * 2.0;
    ((circumference * DOT_DENSITY).floor() as usize).max(1)
}

// Longitude of sample `x` on a ring of `count` evenly spaced samples.
pub fn ring_longitude(x: usize, count: usize) -> f64 {
    -180.0 + (x as f64 * 360.0 / count as f64)
}

/// Orientation whose +Z axis points from `position` to `2 * position`, keeping +Y up.
pub fn face_outward(position: Vec3) -> Quat {
    let Some(z) = position.try_normalize() else {
        return Quat::IDENTITY;
    };
    match Vec3::Y.cross(z).try_normalize() {
        Some(x) => Quat::from_mat3(&Mat3::from_cols(x, z.cross(x), z)),
        // at the poles up is parallel to the normal
        None => Quat::from_rotation_arc(Vec3::Z, z),
    }
}

impl DotField {
    /// Walks latitude rings from 90 down to -89 and keeps every sample the index marks as land.
    ///
    /// Each dot gets its own uniform set in `arena`; its time phase is `band * sin(random)`.
    pub fn generate<R: Rng + ?Sized>(
        index: &VisibilityIndex,
        arena: &mut UniformArena,
        rng: &mut R,
    ) -> Self {
        let mut dots = Vec::new();

        for (band, lat) in (-89..=90).rev().enumerate() {
            let count = dots_for_lat(lat);

            for x in 0..count {
                let lon = ring_longitude(x, count);
                if !index.is_visible(lon, lat) {
                    continue;
                }

                let position = geo::to_cartesian(f64::from(lat), lon, DOT_SPHERE_RADIUS).as_vec3();
                let phase = band as f64 * rng.gen::<f64>().sin();
                let material = arena.push(UniformSet::new(phase as f32));

                dots.push(Dot {
                    position,
                    rotation: face_outward(position),
                    material,
                });
            }
        }

        log::info!("dot field generated: {} dots", dots.len());
        Self { dots }
    }

    pub fn len(&self) -> usize {
        self.dots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GRID_HEIGHT, GRID_WIDTH};
    use image::{Rgba, RgbaImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solid(value: u8) -> VisibilityIndex {
        let img = RgbaImage::from_pixel(GRID_WIDTH, GRID_HEIGHT, Rgba([value, value, value, 255]));
        VisibilityIndex::from_image(&img).unwrap()
    }

    #[test]
    fn ring_sizes() {
        assert_eq!(dots_for_lat(0), 314);
        assert_eq!(dots_for_lat(90), 1);
        assert_eq!(dots_for_lat(-90), 1);
        assert_eq!(dots_for_lat(60), dots_for_lat(-60));
        assert!(dots_for_lat(60) < dots_for_lat(30));
    }

    // Samples exactly halfway between two grid longitudes lose the tie to the
    // first one and fail the strict < 0.5 distance, even on an all-land map.
    fn off_half_degree(lon: f64) -> bool {
        (lon - lon.round()).abs() < 0.5
    }

    #[test]
    fn all_land_skips_half_degree_samples() {
        let mut arena = UniformArena::default();
        let mut rng = StdRng::seed_from_u64(7);
        let index = solid(0);
        let field = DotField::generate(&index, &mut arena, &mut rng);

        let expected: usize = (-89..=90)
            .map(|lat| {
                let n = dots_for_lat(lat);
                (0..n).filter(|&x| off_half_degree(ring_longitude(x, n))).count()
            })
            .sum();
        assert_eq!(expected, 35593);
        assert_eq!(field.len(), expected);
        assert_eq!(arena.len(), expected);
        assert!(field.len() < (-89..=90).map(dots_for_lat).sum::<usize>());

        assert_eq!(dots_for_lat(87), 16);
        assert_eq!(ring_longitude(1, 16), -157.5);
        assert!(!index.is_visible(-157.5, 87));

        let equator = field
            .dots
            .iter()
            .filter(|d| d.position.y.abs() < 1e-4)
            .count();
        assert_eq!(equator, 314);

        // the north pole ring is a single dot with no phase offset
        let first = field.dots[0];
        assert!((first.position.y - 20.0).abs() < 1e-4);
        assert_eq!(arena.get(first.material).u_time, 0.0);
    }

    #[test]
    fn blank_map_yields_no_dots() {
        let mut arena = UniformArena::default();
        let mut rng = StdRng::seed_from_u64(1);
        let field = DotField::generate(&solid(255), &mut arena, &mut rng);
        assert!(field.is_empty());
        assert!(arena.is_empty());
    }

    #[test]
    fn dots_sit_on_sphere_facing_out() {
        let mut arena = UniformArena::default();
        let mut rng = StdRng::seed_from_u64(3);
        let field = DotField::generate(&solid(0), &mut arena, &mut rng);

        for dot in field.dots.iter().step_by(97) {
            assert!((dot.position.length() - 20.0).abs() < 1e-3);
            let forward = dot.rotation * Vec3::Z;
            assert!((forward - dot.position.normalize()).length() < 1e-4, "{dot:?}");
        }
    }

    #[test]
    fn each_dot_owns_a_material() {
        let mut arena = UniformArena::default();
        let mut rng = StdRng::seed_from_u64(11);
        let field = DotField::generate(&solid(0), &mut arena, &mut rng);

        for (i, dot) in field.dots.iter().enumerate() {
            assert_eq!(dot.material.index(), i);
            assert_eq!(arena.get(dot.material).u_max_extrusion, 1.0);
        }
    }

    #[test]
    fn phase_is_seeded() {
        let run = |seed| {
            let mut arena = UniformArena::default();
            let mut rng = StdRng::seed_from_u64(seed);
            DotField::generate(&solid(0), &mut arena, &mut rng);
            arena.sets().iter().map(|u| u.u_time).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }
}
