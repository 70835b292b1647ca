//! Runs every configured dataset on a bounded pool of blocking workers.
//!
//! A failing dataset is logged and skipped; the others carry on.

use crate::config::EngineConfig;
use crate::pipeline::bundle::GridBundle;
use crate::pipeline::dataset::{run_dataset, DatasetOutput};
use crate::pipeline::error::DatasetError;
use crate::pipeline::output::write_dataset_csv;
use log::{error, info};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

#[derive(Debug)]
pub struct SkippedDataset {
    pub name: String,
    pub error: DatasetError,
}

/// Completed and skipped datasets, both in configuration order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<DatasetOutput>,
    pub skipped: Vec<SkippedDataset>,
}

impl RunSummary {
    pub fn skipped_names(&self) -> Vec<String> {
        self.skipped.iter().map(|s| s.name.clone()).collect()
    }
}

/// Available cores minus `reserved_cores`, never less than one.
pub fn worker_count(reserved_cores: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    available.saturating_sub(reserved_cores).max(1)
}

/// Sampler seed of the `index`-th dataset.
fn dataset_seed(base: Option<u64>, index: usize) -> Option<u64> {
    base.map(|seed| seed.wrapping_add(index as u64))
}

/// Processes `config.datasets` concurrently. When `output_dir` is set each
/// completed dataset is also written there as CSV; a failed write skips it.
pub async fn run_all(
    bundle: Arc<GridBundle>,
    config: Arc<EngineConfig>,
    raw_root: &Path,
    output_dir: Option<&Path>,
) -> RunSummary {
    let workers = worker_count(config.reserved_cores);
    info!(
        "Processing {} datasets on {} workers",
        config.datasets.len(),
        workers
    );
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut tasks = JoinSet::new();
    let mut pending = HashMap::new();
    for (index, spec) in config.datasets.iter().cloned().enumerate() {
        let name = spec.name.clone();
        let bundle = Arc::clone(&bundle);
        let config = Arc::clone(&config);
        let semaphore = Arc::clone(&semaphore);
        let raw_root: PathBuf = raw_root.to_path_buf();
        let output_dir: Option<PathBuf> = output_dir.map(Path::to_path_buf);

        let handle = tasks.spawn(async move {
            // The semaphore is never closed, so acquiring only waits for a free worker.
            let _permit = semaphore.acquire_owned().await.ok();
            let seed = dataset_seed(config.random_seed, index);
            task::spawn_blocking(move || {
                let output = run_dataset(&spec, &bundle, &raw_root, &config, seed)?;
                if let Some(dir) = output_dir {
                    write_dataset_csv(&output, &dir)?;
                }
                Ok::<DatasetOutput, DatasetError>(output)
            })
            .await?
        });
        pending.insert(handle.id(), (index, name));
    }

    let mut completed = Vec::new();
    let mut skipped = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(join_error) => (join_error.id(), Err(DatasetError::from(join_error))),
        };
        let Some((index, name)) = pending.remove(&id) else {
            continue;
        };
        match result {
            Ok(output) => completed.push((index, output)),
            Err(error) => {
                error!("Skipping dataset {name}: {error}");
                skipped.push((index, SkippedDataset { name, error }));
            }
        }
    }

    completed.sort_by_key(|(index, _)| *index);
    skipped.sort_by_key(|(index, _)| *index);
    let summary = RunSummary {
        completed: completed.into_iter().map(|(_, output)| output).collect(),
        skipped: skipped.into_iter().map(|(_, skipped)| skipped).collect(),
    };
    info!(
        "{} datasets completed, {} skipped",
        summary.completed.len(),
        summary.skipped.len()
    );
    summary
}
