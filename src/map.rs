// map.rs — world mask raster -> per-latitude land index

use crate::error::{GlobeError, Result};
use image::io::Reader as ImageReader;
use image::{DynamicImage, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// one sample per degree: lon -180..=180, lat 90..=-90
pub const GRID_WIDTH: u32 = 361;
pub const GRID_HEIGHT: u32 = 181;

// r, g and b all below this count as land
const LAND_THRESHOLD: u8 = 80;

/// Integer longitudes classified as land, keyed by integer latitude.
#[derive(Debug, Clone, Default)]
pub struct VisibilityIndex {
    // rows[0] is lat 90, rows[180] is lat -90
    rows: Vec<Vec<i32>>,
}

impl VisibilityIndex {
    pub fn from_rgba(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        if data.len() % 4 != 0 {
            return Err(GlobeError::MalformedPixels { len: data.len() });
        }
        if width != GRID_WIDTH || height != GRID_HEIGHT {
            return Err(GlobeError::GridMismatch {
                width,
                height,
                expected_width: GRID_WIDTH,
                expected_height: GRID_HEIGHT,
            });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(GlobeError::PixelCountMismatch {
                expected,
                actual: data.len(),
            });
        }

        let mut rows = vec![Vec::new(); height as usize];
        let mut row = 0usize;
        let mut lon = -180i32;

        for px in data.chunks_exact(4) {
            let (r, g, b) = (px[0], px[1], px[2]);
            if r < LAND_THRESHOLD && g < LAND_THRESHOLD && b < LAND_THRESHOLD {
                rows[row].push(lon);
            }

            if lon == 180 {
                lon = -180;
                row += 1;
            } else {
                lon += 1;
            }
        }

        let index = Self { rows };
        log::debug!("visibility index built: {} land samples", index.land_count());
        Ok(index)
    }

    pub fn from_image(img: &RgbaImage) -> Result<Self> {
        Self::from_rgba(img.width(), img.height(), img.as_raw())
    }

    pub fn longitudes(&self, lat: i32) -> &[i32] {
        if !(-90..=90).contains(&lat) {
            return &[];
        }
        self.rows
            .get((90 - lat) as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when the land sample nearest to `lon` on this latitude lies within half a degree.
    ///
    /// On an exact tie between two samples the earlier one is kept.
    pub fn is_visible(&self, lon: f64, lat: i32) -> bool {
        let closest = self.longitudes(lat).iter().copied().reduce(|p, c| {
            if (f64::from(c) - lon).abs() < (f64::from(p) - lon).abs() {
                c
            } else {
                p
            }
        });

        match closest {
            Some(c) => (lon - f64::from(c)).abs() < 0.5,
            None => false,
        }
    }

    pub fn land_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.land_count() == 0
    }
}

// Nearest filtering keeps source colors so the land threshold still applies.
pub fn fit_to_grid(img: DynamicImage) -> RgbaImage {
    if img.width() == GRID_WIDTH && img.height() == GRID_HEIGHT {
        return img.to_rgba8();
    }
    log::warn!(
        "map mask is {}x{}, resampling to {}x{}",
        img.width(),
        img.height(),
        GRID_WIDTH,
        GRID_HEIGHT
    );
    img.resize_exact(GRID_WIDTH, GRID_HEIGHT, image::imageops::FilterType::Nearest)
        .to_rgba8()
}

pub fn decode_mask(path: &Path) -> Result<RgbaImage> {
    let reader = BufReader::new(File::open(path)?);
    let img = ImageReader::new(reader).with_guessed_format()?.decode()?;
    Ok(fit_to_grid(img))
}
