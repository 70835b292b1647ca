//! One dataset end to end: index its monthly stacks, sample them onto the grid,
//! expand to dated records, then spatial fill and global rescue.

use crate::config::{DatasetSpec, EngineConfig};
use crate::fill::rescue::{rescue_fill, RescueStats};
use crate::fill::spatial::{fill_spatial, SpatialFillStats};
use crate::pipeline::bundle::GridBundle;
use crate::pipeline::error::DatasetError;
use crate::pipeline::expander::{expand_records, MonthlySamples};
use crate::raster::geotiff::read_geotiff_stack;
use crate::raster::index::index_stack_files;
use crate::raster::sampler::{CellSampler, TierStats};
use crate::types::value_table::ValueTable;
use log::{debug, info};
use std::path::Path;

/// Counts reported when a dataset completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetReport {
    pub name: String,
    pub stacks: usize,
    pub records: usize,
    pub tiers: TierStats,
    pub absent_after_sampling: usize,
    pub absent_after_spatial: usize,
    pub absent_after_rescue: usize,
    pub spatial: SpatialFillStats,
    pub rescue: RescueStats,
}

#[derive(Debug, Clone)]
pub struct DatasetOutput {
    pub spec: DatasetSpec,
    pub table: ValueTable,
    pub report: DatasetReport,
}

/// Reads, samples and fills every stack of `spec` found under `raw_root`.
pub fn run_dataset(
    spec: &DatasetSpec,
    bundle: &GridBundle,
    raw_root: &Path,
    config: &EngineConfig,
    seed: Option<u64>,
) -> Result<DatasetOutput, DatasetError> {
    let folder = raw_root.join(&spec.folder);
    let files = index_stack_files(&folder)?;
    if files.is_empty() {
        return Err(DatasetError::NoRasterFiles(folder));
    }
    info!(
        "{}: sampling {} monthly stacks from {}",
        spec.name,
        files.len(),
        folder.display()
    );

    let mut sampler = CellSampler::seeded(config.n_random, seed);
    let mut table = ValueTable::new(bundle.cell_ids.clone());
    let mut tiers = TierStats::default();

    for file in &files {
        let samples = {
            let stack = read_geotiff_stack(&file.path)?;
            sampler.sample_stack(&stack, bundle.grid.cells())
        };
        debug!(
            "{}: {}-{:02} centroid {}, edge mean {}, interior mean {}, absent {}",
            spec.name,
            file.year,
            file.month,
            samples.stats.centroid,
            samples.stats.edge_mean,
            samples.stats.interior_mean,
            samples.stats.absent
        );
        tiers.merge(&samples.stats);
        expand_records(
            &mut table,
            MonthlySamples {
                year: file.year,
                month: file.month,
                values: samples.values,
            },
        )?;
    }

    let report = fill_gaps(&spec.name, &mut table, bundle, config, files.len(), tiers)?;
    Ok(DatasetOutput {
        spec: spec.clone(),
        table,
        report,
    })
}

/// Spatial fill followed by global rescue, in place.
pub fn fill_gaps(
    name: &str,
    table: &mut ValueTable,
    bundle: &GridBundle,
    config: &EngineConfig,
    stacks: usize,
    tiers: TierStats,
) -> Result<DatasetReport, DatasetError> {
    let absent_after_sampling = table.missing_count();
    let spatial = fill_spatial(table, &bundle.rings, config.max_k, config.min_neighbors);
    let absent_after_spatial = table.missing_count();
    let rescue = rescue_fill(table, &bundle.centers)?;
    let absent_after_rescue = table.missing_count();

    let report = DatasetReport {
        name: name.to_string(),
        stacks,
        records: table.len(),
        tiers,
        absent_after_sampling,
        absent_after_spatial,
        absent_after_rescue,
        spatial,
        rescue,
    };
    info!(
        "{}: {} records from {} stacks, absent {} after sampling, {} after spatial fill, {} after rescue",
        report.name,
        report.records,
        report.stacks,
        report.absent_after_sampling,
        report.absent_after_spatial,
        report.absent_after_rescue
    );
    Ok(report)
}
