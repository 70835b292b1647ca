use crate::fill::error::FillError;
use crate::raster::error::RasterError;
use crate::types::value_table::TableError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error("No monthly GeoTIFF found in '{0}'")]
    NoRasterFiles(PathBuf),

    #[error("No cell holds a valid value in any of the {dates} dates")]
    NoValidCells { dates: usize },

    #[error(transparent)]
    Fill(FillError),

    #[error("Sampled rows do not fit the value table")]
    Table(#[from] TableError),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Failed to write table '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<FillError> for DatasetError {
    fn from(value: FillError) -> Self {
        match value {
            FillError::NoValidCells { dates } => DatasetError::NoValidCells { dates },
            other => DatasetError::Fill(other),
        }
    }
}
