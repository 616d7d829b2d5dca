// scene.rs — everything the globe draws, and the per-frame mutation of it

use crate::animation::{ExtrusionController, UniformArena};
use crate::dots::DotField;
use crate::error::Result;
use crate::map::VisibilityIndex;
use crate::routes::{self, City, Route, RouteSettings};
use image::RgbaImage;
use rand::Rng;
use std::time::Instant;

/// Outcome of the one-shot background mask decode.
pub enum MapLoad {
    Decoded(RgbaImage),
    Failed(String),
}

/// What the render surface draws: dots, routes and their uniform state.
///
/// Dots and routes stay empty until a map load outcome arrives.
pub struct GlobeScene {
    pub dots: DotField,
    pub routes: Vec<Route>,
    pub uniforms: UniformArena,
    pub extrusion: ExtrusionController,
    cities: Vec<City>,
    route_settings: RouteSettings,
    map_ready: bool,
    map_error: Option<String>,
    /// Bumped whenever dots or routes are rebuilt.
    generation: u64,
}

impl GlobeScene {
    pub fn new(
        cities: Vec<City>,
        route_settings: RouteSettings,
        animate_extrusion: bool,
        now: Instant,
    ) -> Self {
        Self {
            dots: DotField::default(),
            routes: Vec::new(),
            uniforms: UniformArena::default(),
            extrusion: ExtrusionController::new(animate_extrusion, now),
            cities,
            route_settings,
            map_ready: false,
            map_error: None,
            generation: 0,
        }
    }

    pub fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    // Why the last load produced no dots, if it failed.
    pub fn map_error(&self) -> Option<&str> {
        self.map_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Builds the dot field from a decoded mask and, on the first load, the routes.
    ///
    /// A failed decode leaves the globe without dots but still draws the routes.
    pub fn apply_map<R: Rng + ?Sized>(&mut self, load: MapLoad, rng: &mut R) -> Result<()> {
        match load {
            MapLoad::Decoded(img) => match VisibilityIndex::from_image(&img) {
                Ok(index) => {
                    log::info!("map mask indexed: {} land samples", index.land_count());
                    self.uniforms.clear();
                    self.dots = DotField::generate(&index, &mut self.uniforms, rng);
                    self.map_error = None;
                }
                Err(e) => {
                    log::error!("map mask rejected, drawing without dots: {e}");
                    self.clear_dots();
                    self.map_error = Some(e.to_string());
                }
            },
            MapLoad::Failed(reason) => {
                log::error!("map mask unavailable, drawing without dots: {reason}");
                self.clear_dots();
                self.map_error = Some(reason);
            }
        }

        let first = !self.map_ready;
        self.map_ready = true;
        self.generation += 1;
        if first {
            self.regenerate_routes(rng)?;
        }
        Ok(())
    }

    pub fn regenerate_routes<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.routes = routes::generate_routes(&self.cities, &self.route_settings, rng)?;
        self.generation += 1;
        Ok(())
    }

    pub fn pointer_down(&mut self, now: Instant, over_globe: bool) {
        self.extrusion.pointer_down(now, over_globe);
    }

    pub fn pointer_up(&mut self, now: Instant) {
        self.extrusion.pointer_up(now);
    }

    /// One display refresh: twinkle clocks advance, extrusion follows the grab state.
    pub fn frame(&mut self, now: Instant) {
        self.uniforms.tick();
        self.extrusion.update(now, &mut self.uniforms);
    }

    fn clear_dots(&mut self) {
        self.dots = DotField::default();
        self.uniforms.clear();
    }
}
