// Sphere and disc mesh generators for the globe pipelines

use std::f32::consts::{PI, TAU};

/// Opaque-ish sphere under the dots; also the pointer pick target.
pub const BASE_SPHERE_RADIUS: f32 = 19.5;
pub const BASE_SPHERE_SEGMENTS: usize = 35;
pub const DOT_RADIUS: f32 = 0.1;
pub const DOT_SEGMENTS: usize = 5;

#[derive(Debug, Clone)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

pub fn build_sphere(radius: f32, lat: usize, lon: usize) -> Mesh {
    let mut positions = Vec::with_capacity((lat + 1) * (lon + 1));
    let mut indices = Vec::with_capacity(lat * lon * 6);

    for i in 0..=lat {
        let theta = PI * (i as f32) / (lat as f32);
        let y = radius * theta.cos();
        let sin_t = theta.sin();

        for j in 0..=lon {
            let phi = TAU * (j as f32) / (lon as f32);
            positions.push([radius * phi.cos() * sin_t, y, radius * phi.sin() * sin_t]);
        }
    }

    for i in 0..lat {
        for j in 0..lon {
            let a = (i * (lon + 1) + j) as u32;
            let b = a + (lon + 1) as u32;

            indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }

    Mesh { positions, indices }
}

/// Flat disc in the local XY plane, facing +Z.
pub fn build_disc(radius: f32, segments: usize) -> Mesh {
    let segments = segments.max(3);
    let mut positions = Vec::with_capacity(segments + 2);
    positions.push([0.0, 0.0, 0.0]);

    for s in 0..=segments {
        let a = TAU * s as f32 / segments as f32;
        positions.push([radius * a.cos(), radius * a.sin(), 0.0]);
    }

    let indices = (1..=segments as u32)
        .flat_map(|s| [s, s + 1, 0])
        .collect();

    Mesh { positions, indices }
}
