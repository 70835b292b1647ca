use crate::geometry::error::GeometryError;
use crate::pipeline::error::DatasetError;
use crate::raster::error::RasterError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HexfillError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("No dataset completed successfully ({skipped} skipped), nothing to merge")]
    NothingToMerge { skipped: usize },

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("Invalid H3 resolution {0}, expected a value in 0..=15")]
    InvalidResolution(u8),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("Dataset name '{0}' is configured more than once")]
    DuplicateDataset(String),

    #[error("Output column '{0}' is used by more than one dataset")]
    DuplicateColumn(String),

    #[error("Output column '{0}' clashes with a key column of the output tables")]
    ReservedColumn(String),
}
