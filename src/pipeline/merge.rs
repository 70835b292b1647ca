//! Outer join of the per-dataset tables on `(h3_index, date)`.

use crate::pipeline::dataset::DatasetOutput;
use crate::pipeline::error::DatasetError;
use crate::types::value_table::{COL_CELL, COL_DATE};
use log::info;
use polars::prelude::*;

/// Which datasets made it into the merged table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub included: Vec<String>,
    pub skipped: Vec<String>,
    pub rows: usize,
}

/// Full outer join of `(h3_index, date, <value>)` frames, sorted by key. A key
/// missing from a dataset leaves that dataset's column null. Returns `None` when
/// `frames` is empty.
pub fn merge_tables(frames: Vec<DataFrame>) -> PolarsResult<Option<DataFrame>> {
    let mut frames = frames.into_iter();
    let Some(first) = frames.next() else {
        return Ok(None);
    };
    let keys = [col(COL_CELL), col(COL_DATE)];
    let merged = frames.fold(first.lazy(), |acc, df| {
        acc.join(
            df.lazy(),
            keys.clone(),
            keys.clone(),
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
    });
    merged
        .sort([COL_CELL, COL_DATE], SortMultipleOptions::default())
        .collect()
        .map(Some)
}

/// Merges every completed dataset. `skipped` names the datasets that failed.
pub fn merge_outputs(
    completed: &[DatasetOutput],
    skipped: &[String],
) -> Result<(Option<DataFrame>, MergeReport), DatasetError> {
    let frames = completed
        .iter()
        .map(|output| output.table.to_dataframe(&output.spec.column))
        .collect::<PolarsResult<Vec<_>>>()?;
    let merged = merge_tables(frames)?;

    let report = MergeReport {
        included: completed.iter().map(|o| o.spec.name.clone()).collect(),
        skipped: skipped.to_vec(),
        rows: merged.as_ref().map_or(0, DataFrame::height),
    };
    info!(
        "Merged {} rows from datasets [{}], skipped [{}]",
        report.rows,
        report.included.join(", "),
        report.skipped.join(", ")
    );
    Ok((merged, report))
}
