// config.rs
//
// Runtime configuration:
// - File: --config <path>, else <exe_dir>/assets/globe.json, else ./assets/globe.json
// - CLI overrides: --map <path>, --seed <u64>
// - Env: DOT_GLOBE_SEED (used when --seed is absent)
// - Missing file: built-in defaults

use crate::error::Result;
use crate::routes::{City, RouteSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "globe.json";
const SEED_ENV: &str = "DOT_GLOBE_SEED";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// World mask image; dark pixels are land.
    pub map_path: PathBuf,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
    pub route_count: usize,
    pub auto_rotate: bool,
    /// Tween extrusion changes instead of stepping them.
    pub animate_extrusion: bool,
    /// Replaces the built-in capital registry.
    pub cities: Option<Vec<City>>,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("assets").join("world_alpha_mini.jpg"),
            seed: None,
            route_count: RouteSettings::default().count,
            auto_rotate: true,
            animate_extrusion: true,
            cities: None,
        }
    }
}

impl GlobeConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn route_settings(&self) -> RouteSettings {
        RouteSettings {
            count: self.route_count,
            ..RouteSettings::default()
        }
    }

    /// Resolves the config from a command line (program name first) and the environment.
    pub fn resolve(args: &[String]) -> Self {
        let path = flag_value(args, "--config")
            .map(PathBuf::from)
            .or_else(find_config_file);

        let mut config = match path {
            Some(p) => match Self::load(&p) {
                Ok(c) => {
                    log::info!("config loaded from {}", p.display());
                    c
                }
                Err(e) => {
                    log::warn!("ignoring config {}: {}", p.display(), e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        if let Some(map) = flag_value(args, "--map") {
            config.map_path = PathBuf::from(map);
        }

        let seed = flag_value(args, "--seed")
            .map(str::to_owned)
            .or_else(|| std::env::var(SEED_ENV).ok());
        if let Some(raw) = seed {
            match raw.trim().parse::<u64>() {
                Ok(s) => config.seed = Some(s),
                Err(_) => log::warn!("seed {raw:?} is not a u64, ignoring"),
            }
        }

        config
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut it = args.iter();
    while let Some(a) = it.next() {
        if a == flag {
            return it.next().map(String::as_str);
        }
    }
    None
}

/// Find assets/globe.json by searching:
/// 1) <exe_dir>/assets/globe.json
/// 2) ./assets/globe.json
fn find_config_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join(CONFIG_FILE);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join(CONFIG_FILE);
    if p.exists() {
        return Some(p);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = GlobeConfig::from_json(r#"{ "seed": 12, "route_count": 8 }"#).unwrap();
        assert_eq!(c.seed, Some(12));
        assert_eq!(c.route_count, 8);
        assert!(c.auto_rotate);
        assert!(c.animate_extrusion);
        assert_eq!(c.route_settings().count, 8);
        assert_eq!(c.route_settings().steps, 120);
    }

    #[test]
    fn cities_override() {
        let c = GlobeConfig::from_json(
            r#"{ "cities": [ { "name": "A", "lat": 1.0, "lon": 2.0 }, { "name": "B", "lat": -3.0, "lon": 4.5 } ] }"#,
        )
        .unwrap();
        let cities = c.cities.unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1], City::new("B", -3.0, 4.5));
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = GlobeConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, crate::error::GlobeError::Config(_)));
    }

    #[test]
    fn cli_overrides() {
        let c = GlobeConfig::resolve(&args(&[
            "dot_globe",
            "--config",
            "/definitely/missing/globe.json",
            "--map",
            "mask.png",
            "--seed",
            "99",
        ]));
        assert_eq!(c.map_path, PathBuf::from("mask.png"));
        assert_eq!(c.seed, Some(99));
    }

    #[test]
    fn flag_without_value() {
        assert_eq!(flag_value(&args(&["x", "--map"]), "--map"), None);
        assert_eq!(flag_value(&args(&["x", "--map", "m"]), "--map"), Some("m"));
    }
}
