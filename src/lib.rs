pub mod config;
mod error;
pub mod fill;
pub mod geometry;
mod hexfill;
pub mod pipeline;
pub mod raster;
mod types;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::{DatasetSpec, EngineConfig, DEFAULT_METRIC_PROJ};
pub use error::{ConfigError, HexfillError};
pub use hexfill::*;

pub use types::lat_lon::LatLon;
pub use types::value_table::{Record, TableError, ValueTable, COL_CELL, COL_DATE};

pub use fill::error::FillError;
pub use geometry::error::GeometryError;
pub use geometry::hex_grid::{Cell, HexGrid};
pub use pipeline::bundle::GridBundle;
pub use pipeline::dataset::{DatasetOutput, DatasetReport};
pub use pipeline::error::DatasetError;
pub use pipeline::merge::MergeReport;
pub use pipeline::orchestrator::{RunSummary, SkippedDataset};
pub use raster::error::RasterError;
