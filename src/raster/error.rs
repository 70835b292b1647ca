use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to read raster folder '{0}'")]
    FolderRead(PathBuf, #[source] std::io::Error),

    #[error("Cannot parse year and month from raster file name '{0}'")]
    FileNameDate(PathBuf),

    #[error("Failed to open raster '{0}'")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode GeoTIFF '{0}'")]
    Decode(PathBuf, #[source] tiff::TiffError),

    #[error("GeoTIFF '{0}' has no usable georeferencing tags")]
    MissingGeoreference(PathBuf),

    #[error("Unsupported sample format in '{path}': {format}")]
    UnsupportedSampleFormat { path: PathBuf, format: String },

    #[error("Band {band} holds {found} pixels, expected {expected} ({width}x{height})")]
    BandLayout {
        band: usize,
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },

    #[error("Raster stack has no bands")]
    EmptyStack,
}

/// Why a single point could not be read. Never fatal: the sampler falls through
/// to its next tier.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SampleError {
    #[error("Point ({x}, {y}) lies outside the raster extent")]
    OutOfExtent { x: f64, y: f64 },

    #[error("Band {band} requested but the stack has {count} bands")]
    BandOutOfRange { band: usize, count: usize },
}
