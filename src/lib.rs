//! Dot-matrix world globe: a sphere covered in land dots sampled from a mask image,
//! with lifted great-circle-ish arcs between random capital cities.
//!
//! The geometric core (`geo`, `map`, `dots`, `routes`, `animation`) is pure and
//! deterministic given its inputs and an RNG; `renderer` and the binary wire it to a window.

pub mod animation;
pub mod camera;
pub mod config;
pub mod dots;
pub mod error;
pub mod geo;
pub mod map;
pub mod mesh;
pub mod renderer;
pub mod routes;
pub mod scene;

pub use error::{GlobeError, Result};
