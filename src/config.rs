//! Engine configuration: grid parameters, gap-filling thresholds and the
//! datasets to process.
//!
//! An [`EngineConfig`] can be built in code with its builder or loaded from a JSON
//! file with [`EngineConfig::from_json_file`]. Missing JSON fields fall back to the
//! defaults used for the Mekong delta study region.

use crate::error::ConfigError;
use crate::types::value_table::{COL_CELL, COL_DATE};
use bon::Builder;
use h3o::Resolution;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// UTM zone 48N, the metric CRS used for buffering and area computations by default.
pub const DEFAULT_METRIC_PROJ: &str = "+proj=utm +zone=48 +datum=WGS84 +units=m +no_defs";

/// One named raster collection (rain, temperature, humidity, ...) to sample onto the grid.
///
/// # Examples
///
/// ```
/// use hexfill::DatasetSpec;
///
/// let rain = DatasetSpec::new("rain", "daily_rain", "rain_mm");
/// assert_eq!(rain.output_file_name().to_str(), Some("h3_rain_daily.csv"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Unique dataset name, used in logs and reports.
    pub name: String,
    /// Folder holding one GeoTIFF per (year, month), relative to the raw data root.
    pub folder: PathBuf,
    /// Column name of this dataset's values in the output tables.
    pub column: String,
    /// Output CSV file name. Defaults to `h3_<name>_daily.csv`.
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

impl DatasetSpec {
    pub fn new(
        name: impl Into<String>,
        folder: impl Into<PathBuf>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            column: column.into(),
            output_file: None,
        }
    }

    pub fn output_file_name(&self) -> PathBuf {
        self.output_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("h3_{}_daily.csv", self.name)))
    }
}

/// Every knob the engine consumes.
///
/// # Examples
///
/// ```
/// use hexfill::{DatasetSpec, EngineConfig};
///
/// let config = EngineConfig::builder()
///     .max_k(2)
///     .min_neighbors(1)
///     .random_seed(42)
///     .datasets(vec![DatasetSpec::new("temp", "daily_temp", "temp_c")])
///     .build();
///
/// assert_eq!(config.resolution, 7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct EngineConfig {
    /// H3 resolution of the grid.
    #[builder(default = 7)]
    pub resolution: u8,
    /// Outward buffer applied to the boundary before tessellation, in meters.
    #[builder(default = 2441.2)]
    pub buffer_m: f64,
    /// Boundary parts with an area at or below this threshold are dropped.
    #[builder(default = 600.0)]
    pub min_island_area_km2: f64,
    /// proj4 definition of the metric CRS used for buffering and area.
    #[builder(default = DEFAULT_METRIC_PROJ.to_string())]
    pub metric_proj: String,
    /// Maximum ring depth of the spatial filler.
    #[builder(default = 3)]
    pub max_k: usize,
    /// Minimum number of valid same-date neighbors needed to fill a value.
    #[builder(default = 3)]
    pub min_neighbors: usize,
    /// Number of random interior points drawn by the last sampling tier.
    #[builder(default = 15)]
    pub n_random: usize,
    /// Seed for the interior sampler. `None` seeds from OS entropy.
    pub random_seed: Option<u64>,
    /// Cores left free for the host when sizing the worker pool.
    #[builder(default = 1)]
    pub reserved_cores: usize,
    /// Boundary feature property holding the administrative name.
    #[builder(default = "ADM1_NAME".to_string())]
    pub admin_field: String,
    /// Administrative names to keep. Empty keeps every feature.
    #[builder(default)]
    pub admin_names: Vec<String>,
    #[builder(default)]
    pub datasets: Vec<DatasetSpec>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: EngineConfig = serde_json::from_str(&text)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn h3_resolution(&self) -> Result<Resolution, ConfigError> {
        Resolution::try_from(self.resolution)
            .map_err(|_| ConfigError::InvalidResolution(self.resolution))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.h3_resolution()?;
        if !(self.buffer_m.is_finite() && self.buffer_m >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "buffer_m",
                message: format!("expected a non-negative distance, got {}", self.buffer_m),
            });
        }
        if !(self.min_island_area_km2.is_finite() && self.min_island_area_km2 >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "min_island_area_km2",
                message: format!(
                    "expected a non-negative area, got {}",
                    self.min_island_area_km2
                ),
            });
        }
        if self.max_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_k",
                message: "ring depth must be at least 1".to_string(),
            });
        }
        if self.min_neighbors == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_neighbors",
                message: "at least one neighbor is required to fill a value".to_string(),
            });
        }

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        for spec in &self.datasets {
            if spec.column == COL_CELL || spec.column == COL_DATE {
                return Err(ConfigError::ReservedColumn(spec.column.clone()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateDataset(spec.name.clone()));
            }
            if !columns.insert(spec.column.as_str()) {
                return Err(ConfigError::DuplicateColumn(spec.column.clone()));
            }
        }
        Ok(())
    }
}
