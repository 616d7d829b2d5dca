
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlobeError>;

#[derive(Debug, Error)]
pub enum GlobeError {
    /// Pixel buffer is not a whole number of RGBA quadruplets.
    #[error("malformed pixel buffer: {len} bytes is not a multiple of 4")]
    MalformedPixels { len: usize },

    /// Mask raster does not cover the one-sample-per-degree grid.
    #[error("map mask is {width}x{height}, expected {expected_width}x{expected_height}")]
    GridMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("pixel buffer holds {actual} bytes, dimensions require {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },

    /// A route needs two distinct registry entries.
    #[error("city registry has {0} entries, at least 2 are required")]
    TooFewCities(usize),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("no compatible GPU adapter")]
    NoAdapter,

    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}
