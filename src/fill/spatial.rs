use crate::fill::neighbors::NeighborRings;
use crate::types::value_table::ValueTable;
use log::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialFillStats {
    pub missing_before: usize,
    /// `filled_at_k[k - 1]` values were filled from the disk of radius `k`.
    pub filled_at_k: Vec<usize>,
    pub missing_after: usize,
}

impl SpatialFillStats {
    pub fn filled(&self) -> usize {
        self.filled_at_k.iter().sum()
    }
}

/// Fills missing (cell, date) values with the mean of valid same-date neighbors.
///
/// For each missing value the disk radius grows from 1 to `max_k`; the first disk
/// holding at least `min_neighbors` valid values supplies the mean. Means are taken
/// over each date's values as they were before the pass, so a value filled here
/// never feeds another fill.
pub fn fill_spatial(
    table: &mut ValueTable,
    rings: &NeighborRings,
    max_k: usize,
    min_neighbors: usize,
) -> SpatialFillStats {
    let max_k = max_k.min(rings.max_k());
    let min_neighbors = min_neighbors.max(1);
    let mut stats = SpatialFillStats {
        missing_before: table.missing_count(),
        filled_at_k: vec![0; max_k],
        missing_after: 0,
    };

    for date_idx in 0..table.date_count() {
        let original = table.row(date_idx).to_vec();
        if original.iter().all(Option::is_some) {
            continue;
        }
        let row = table.row_mut(date_idx);
        for (cell, slot) in row.iter_mut().enumerate() {
            if slot.is_some() {
                continue;
            }
            for k in 1..=max_k {
                let (sum, count) = rings
                    .disk(cell, k)
                    .iter()
                    .filter_map(|&n| original[n])
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                if count >= min_neighbors {
                    *slot = Some(sum / count as f64);
                    stats.filled_at_k[k - 1] += 1;
                    break;
                }
            }
        }
    }

    stats.missing_after = table.missing_count();
    debug!(
        "Spatial fill: {} missing before, {} filled {:?} by radius, {} still missing",
        stats.missing_before,
        stats.filled(),
        stats.filled_at_k,
        stats.missing_after
    );
    stats
}
