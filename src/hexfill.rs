//! Main entry point: builds or loads the hex grid, runs every configured dataset
//! and merges the completed ones into a single table.

use crate::config::EngineConfig;
use crate::error::HexfillError;
use crate::geometry::boundary::{clean_boundary, load_boundary};
use crate::geometry::grid_io::{read_grid_geojson, write_grid_geojson};
use crate::geometry::hex_grid::HexGrid;
use crate::geometry::projection::MetricProjection;
use crate::pipeline::bundle::GridBundle;
use crate::pipeline::dataset::DatasetReport;
use crate::pipeline::merge::{merge_outputs, MergeReport};
use crate::pipeline::orchestrator::{run_all, SkippedDataset};
use crate::pipeline::output::write_csv;
use crate::utils::ensure_dir_exists;
use bon::bon;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the merged table when none is given.
pub const DEFAULT_MERGED_FILE: &str = "h3_merged_daily.csv";

/// Outcome of [`HexFill::run`].
#[derive(Debug)]
pub struct RunReport {
    /// Completion report of every dataset that made it into the merge.
    pub datasets: Vec<DatasetReport>,
    /// Datasets that failed, with the reason.
    pub skipped: Vec<SkippedDataset>,
    pub merge: MergeReport,
    /// Path of the merged CSV.
    pub merged_path: PathBuf,
}

/// Drives the whole workflow for one [`EngineConfig`].
///
/// # Examples
///
/// ```rust,no_run
/// # use hexfill::{HexFill, HexfillError};
/// # use std::path::Path;
/// # #[tokio::main]
/// # async fn main() -> Result<(), HexfillError> {
/// let hexfill = HexFill::from_json_file(Path::new("config.json"))?;
/// let grid = hexfill
///     .build_grid()
///     .boundary_path(Path::new("data/boundary.geojson"))
///     .grid_path(Path::new("data/h3_grid.geojson"))
///     .call()?;
/// let report = hexfill
///     .run()
///     .grid(grid)
///     .raw_root(Path::new("data/raw"))
///     .output_dir(Path::new("data/processed"))
///     .call()
///     .await?;
/// println!("Merged {} rows", report.merge.rows);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HexFill {
    config: Arc<EngineConfig>,
}

#[bon]
impl HexFill {
    /// Wraps a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HexfillError::Config`] when [`EngineConfig::validate`] fails.
    pub fn new(config: EngineConfig) -> Result<Self, HexfillError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, HexfillError> {
        let config = EngineConfig::from_json_file(path)?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads the boundary, drops small islands and tessellates it.
    ///
    /// # Arguments
    ///
    /// * `.boundary_path(&Path)`: **Required.** GeoJSON FeatureCollection of the region.
    /// * `.grid_path(&Path)`: Optional. Where to write the grid artifact as GeoJSON.
    ///
    /// # Errors
    ///
    /// Returns [`HexfillError::Geometry`] when the boundary cannot be read, no
    /// part survives the island filter, or tessellation fails.
    #[builder]
    pub fn build_grid(
        &self,
        boundary_path: &Path,
        grid_path: Option<&Path>,
    ) -> Result<HexGrid, HexfillError> {
        let config = &self.config;
        let projection = MetricProjection::new(&config.metric_proj)?;
        let boundary = load_boundary(boundary_path, &config.admin_field, &config.admin_names)?;
        let cleaned = clean_boundary(&boundary, config.min_island_area_km2, &projection)?;
        let grid = HexGrid::build(
            &cleaned,
            config.h3_resolution()?,
            config.buffer_m,
            &projection,
        )?;
        if let Some(path) = grid_path {
            write_grid_geojson(&grid, path)?;
        }
        Ok(grid)
    }

    /// Reads a grid artifact written by [`HexFill::build_grid`].
    pub fn load_grid(&self, path: &Path) -> Result<HexGrid, HexfillError> {
        Ok(read_grid_geojson(path)?)
    }

    /// Samples, fills and writes every dataset, then writes the merged table.
    ///
    /// Failing datasets are skipped and reported in [`RunReport::skipped`].
    ///
    /// # Arguments
    ///
    /// * `.grid(HexGrid)`: **Required.** The grid to sample onto.
    /// * `.raw_root(&Path)`: **Required.** Directory holding one folder per dataset.
    /// * `.output_dir(&Path)`: **Required.** Created if missing.
    /// * `.merged_file(&str)`: Optional. Defaults to [`DEFAULT_MERGED_FILE`].
    ///
    /// # Errors
    ///
    /// Returns [`HexfillError::NothingToMerge`] when every dataset failed.
    #[builder]
    pub async fn run(
        &self,
        grid: HexGrid,
        raw_root: &Path,
        output_dir: &Path,
        merged_file: Option<&str>,
    ) -> Result<RunReport, HexfillError> {
        ensure_dir_exists(output_dir)
            .map_err(|e| HexfillError::OutputDirCreation(output_dir.to_path_buf(), e))?;

        let bundle = Arc::new(GridBundle::new(grid, self.config.max_k));
        info!(
            "Grid bundle ready: {} cells, ring depth {}",
            bundle.cell_count(),
            self.config.max_k
        );

        let summary = run_all(
            bundle,
            Arc::clone(&self.config),
            raw_root,
            Some(output_dir),
        )
        .await;
        if summary.completed.is_empty() {
            return Err(HexfillError::NothingToMerge {
                skipped: summary.skipped.len(),
            });
        }

        let (merged, merge) = merge_outputs(&summary.completed, &summary.skipped_names())?;
        let merged_path = output_dir.join(merged_file.unwrap_or(DEFAULT_MERGED_FILE));
        if let Some(mut merged) = merged {
            write_csv(&mut merged, &merged_path)?;
        }

        Ok(RunReport {
            datasets: summary
                .completed
                .into_iter()
                .map(|output| output.report)
                .collect(),
            skipped: summary.skipped,
            merge,
            merged_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetSpec;
    use crate::error::ConfigError;
    use crate::test_utils::{disk_grid, write_over_grid};

    fn two_datasets() -> EngineConfig {
        EngineConfig::builder()
            .random_seed(3)
            .n_random(5)
            .datasets(vec![
                DatasetSpec::new("rain", "daily_rain", "rain_mm"),
                DatasetSpec::new("temp", "daily_temp", "temp_c"),
            ])
            .build()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig::builder().min_neighbors(0).build();
        assert!(matches!(
            HexFill::new(config),
            Err(HexfillError::Config(ConfigError::InvalidValue {
                field: "min_neighbors",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn run_writes_dataset_and_merged_tables() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let grid = disk_grid(1);
        for (folder, value) in [("daily_rain", 2.5f32), ("daily_temp", 28.0)] {
            std::fs::create_dir(raw.path().join(folder)).unwrap();
            write_over_grid(
                &raw.path().join(folder).join("x_2022_6.tif"),
                &grid,
                30,
                |_, _| value,
            );
        }

        let hexfill = HexFill::new(two_datasets()).unwrap();
        let report = hexfill
            .run()
            .grid(grid)
            .raw_root(raw.path())
            .output_dir(out.path())
            .call()
            .await
            .unwrap();

        assert_eq!(report.merge.included, vec!["rain", "temp"]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.merge.rows, 7 * 30);
        assert_eq!(report.datasets.len(), 2);
        assert!(report.datasets.iter().all(|d| d.absent_after_rescue == 0));

        let merged = std::fs::read_to_string(&report.merged_path).unwrap();
        assert_eq!(merged.lines().next(), Some("h3_index,date,rain_mm,temp_c"));
        assert_eq!(merged.lines().count(), 1 + 7 * 30);
        assert!(out.path().join("h3_rain_daily.csv").is_file());
        assert!(out.path().join("h3_temp_daily.csv").is_file());
    }

    #[tokio::test]
    async fn run_fails_when_every_dataset_fails() {
        let raw = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let hexfill = HexFill::new(two_datasets()).unwrap();

        let err = hexfill
            .run()
            .grid(disk_grid(1))
            .raw_root(raw.path())
            .output_dir(&out.path().join("processed"))
            .merged_file("merged.csv")
            .call()
            .await
            .unwrap_err();

        assert!(matches!(err, HexfillError::NothingToMerge { skipped: 2 }));
        assert!(out.path().join("processed").is_dir());
    }

    #[test]
    fn build_grid_drops_islands_and_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = dir.path().join("boundary.geojson");
        std::fs::write(
            &boundary,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"ADM1_NAME": "Mainland"},
                 "geometry": {"type": "Polygon", "coordinates":
                    [[[105.4,9.8],[105.8,9.8],[105.8,10.2],[105.4,10.2],[105.4,9.8]]]}},
                {"type": "Feature", "properties": {"ADM1_NAME": "Islet"},
                 "geometry": {"type": "Polygon", "coordinates":
                    [[[104.0,9.0],[104.02,9.0],[104.02,9.02],[104.0,9.02],[104.0,9.0]]]}}
            ]}"#,
        )
        .unwrap();
        let grid_path = dir.path().join("grid.geojson");

        let hexfill = HexFill::new(EngineConfig::builder().buffer_m(0.0).build()).unwrap();
        let grid = hexfill
            .build_grid()
            .boundary_path(&boundary)
            .grid_path(&grid_path)
            .call()
            .unwrap();

        assert!(!grid.is_empty());
        assert!(grid.centers().iter().all(|c| c.longitude() > 105.0));
        assert_eq!(hexfill.load_grid(&grid_path).unwrap().len(), grid.len());
    }

    #[test]
    fn grid_round_trips_through_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.geojson");
        let grid = disk_grid(1);
        write_grid_geojson(&grid, &path).unwrap();

        let hexfill = HexFill::new(EngineConfig::default()).unwrap();
        let loaded = hexfill.load_grid(&path).unwrap();
        assert_eq!(
            loaded.ids().collect::<Vec<_>>(),
            grid.ids().collect::<Vec<_>>()
        );
        assert!(hexfill.load_grid(&dir.path().join("missing.geojson")).is_err());
    }
}
