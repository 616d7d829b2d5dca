// routes.rs — random city-to-city arcs lifted above the globe

use crate::error::{GlobeError, Result};
use crate::geo;
use glam::Vec3;
use once_cell::sync::Lazy;
use rand::Rng;
use serde::Deserialize;

pub const ROUTE_PALETTE: [u32; 4] = [0x4bb4ff, 0x7ee6ff, 0x2fa3ff, 0x9fdcff];
pub const ROUTE_OPACITY: f32 = 0.75;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

// Jakarta appears more than once; duplicates weight the draw.
static CAPITALS: Lazy<Vec<City>> = Lazy::new(|| {
    [
        ("Jakarta", -6.2088, 106.8456),
        ("London", 51.5074, -0.1278),
        ("Tokyo", 35.6762, 139.6503),
        ("New York", 40.7128, -74.0060),
        ("Paris", 48.8566, 2.3522),
        ("Berlin", 52.5200, 13.4050),
        ("Moscow", 55.7558, 37.6173),
        ("Singapore", 1.3521, 103.8198),
        ("Sydney", -33.8688, 151.2093),
        ("Los Angeles", 34.0522, -118.2437),
        ("Cape Town", -33.9249, 18.4241),
        ("Dubai", 25.2048, 55.2708),
        ("Seoul", 37.5665, 126.9780),
        ("Rome", 41.9028, 12.4964),
        ("Madrid", 40.4168, -3.7038),
        ("Bangkok", 13.7563, 100.5018),
        ("Delhi", 28.6139, 77.2090),
        ("Cairo", 30.0444, 31.2357),
        ("Toronto", 43.6532, -79.3832),
        ("Buenos Aires", -34.6037, -58.3816),
        ("Mexico City", 19.4326, -99.1332),
        ("Istanbul", 41.0082, 28.9784),
        ("Jakarta", -6.2088, 106.8456),
        ("Vienna", 48.2082, 16.3738),
        ("Hanoi", 21.0278, 105.8342),
        ("Lagos", 6.5244, 3.3792),
        ("Lisbon", 38.7223, -9.1393),
        ("Athens", 37.9838, 23.7275),
        ("Kuala Lumpur", 3.1390, 101.6869),
        ("Jakarta2", -6.2088, 106.8456),
    ]
    .into_iter()
    .map(|(name, lat, lon)| City::new(name, lat, lon))
    .collect()
});

pub fn default_cities() -> &'static [City] {
    &CAPITALS
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSettings {
    pub radius: f32,
    pub max_lift: f32,
    // each arc has steps + 1 points
    pub steps: usize,
    pub count: usize,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            radius: 20.0,
            max_lift: 1.2,
            steps: 120,
            count: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub start: usize,
    pub end: usize,
    pub points: Vec<Vec3>,
    pub color: [f32; 4],
}

pub fn hex_color(hex: u32, alpha: f32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        alpha,
    ]
}

// redraws the second index until it differs
pub fn pick_pair<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Result<(usize, usize)> {
    if len < 2 {
        return Err(GlobeError::TooFewCities(len));
    }
    let a = rng.gen_range(0..len);
    let mut b = rng.gen_range(0..len);
    while b == a {
        b = rng.gen_range(0..len);
    }
    Ok((a, b))
}

// Lerp-then-normalize, lifted by a parabola peaking mid-arc.
// Wide separations cut chords; this is not a slerp.
pub fn arc_points(start: Vec3, end: Vec3, settings: &RouteSettings) -> Vec<Vec3> {
    let steps = settings.steps.max(1);

    (0..=steps)
        .map(|k| {
            let i = k as f32 / steps as f32;
            // exact antipodes pass through the origin halfway
            let dir = start.lerp(end, i).try_normalize().unwrap_or(start);
            let t = i * 2.0 - 1.0;
            let lift = (1.0 - t * t) * settings.max_lift;
            dir * (settings.radius + lift)
        })
        .collect()
}

pub fn generate_routes<R: Rng + ?Sized>(
    cities: &[City],
    settings: &RouteSettings,
    rng: &mut R,
) -> Result<Vec<Route>> {
    let routes = (0..settings.count)
        .map(|r| -> Result<Route> {
            let (start, end) = pick_pair(cities.len(), rng)?;
            let from = &cities[start];
            let to = &cities[end];

            let points = arc_points(
                geo::to_unit_direction(from.lat, from.lon),
                geo::to_unit_direction(to.lat, to.lon),
                settings,
            );
            log::trace!("route {r}: {} -> {}", from.name, to.name);

            Ok(Route {
                start,
                end,
                points,
                color: hex_color(ROUTE_PALETTE[r % ROUTE_PALETTE.len()], ROUTE_OPACITY),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("generated {} routes over {} cities", routes.len(), cities.len());
    Ok(routes)
}
