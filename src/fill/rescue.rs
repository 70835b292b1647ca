//! Global rescue for cells that hold no valid value at all after spatial filling.
//!
//! Each empty cell copies the full series of its nearest cell (by center distance)
//! that has data, then residual holes are linearly interpolated over calendar days
//! with edge values held constant.

use crate::fill::error::FillError;
use crate::types::lat_lon::LatLon;
use crate::types::value_table::ValueTable;
use log::{debug, info};
use ordered_float::OrderedFloat;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// R-tree candidates re-ranked by great-circle distance.
const NEAREST_CANDIDATES: usize = 8;

/// A cell with at least one valid value, indexed by its center.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SourceCell {
    position: usize,
    center: LatLon,
}

impl RTreeObject for SourceCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.center.latitude(), self.center.longitude()])
    }
}

impl PointDistance for SourceCell {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.center.latitude() - point[0];
        let dy = self.center.longitude() - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescueStats {
    /// Cells without a single valid value before rescue.
    pub empty_cells: usize,
    pub rescued_cells: usize,
    /// Values filled by temporal interpolation on rescued cells.
    pub interpolated: usize,
    pub missing_after: usize,
}

/// Nearest source cell for `center`, by haversine distance among the R-tree's
/// closest candidates. Ties go to the lower grid position.
fn nearest_source(tree: &RTree<SourceCell>, center: LatLon) -> Option<usize> {
    tree.nearest_neighbor_iter(&[center.latitude(), center.longitude()])
        .take(NEAREST_CANDIDATES)
        .min_by_key(|source| {
            (
                OrderedFloat(center.distance_km(&source.center)),
                source.position,
            )
        })
        .map(|source| source.position)
}

/// Rescues every empty cell of `table`. `centers[i]` is the center of cell `i`.
pub fn rescue_fill(table: &mut ValueTable, centers: &[LatLon]) -> Result<RescueStats, FillError> {
    if centers.len() != table.cell_count() {
        return Err(FillError::CenterCount {
            centers: centers.len(),
            cells: table.cell_count(),
        });
    }

    let valid_counts = table.valid_counts_per_cell();
    let (sources, empty): (Vec<usize>, Vec<usize>) =
        (0..table.cell_count()).partition(|&cell| valid_counts[cell] > 0);

    let mut stats = RescueStats {
        empty_cells: empty.len(),
        ..RescueStats::default()
    };
    if empty.is_empty() {
        stats.missing_after = table.missing_count();
        return Ok(stats);
    }
    if sources.is_empty() {
        return Err(FillError::NoValidCells {
            dates: table.date_count(),
        });
    }

    let tree = RTree::bulk_load(
        sources
            .iter()
            .map(|&position| SourceCell {
                position,
                center: centers[position],
            })
            .collect(),
    );
    let days = day_offsets(table);

    for &cell in &empty {
        let Some(source) = nearest_source(&tree, centers[cell]) else {
            continue;
        };
        let mut series = table.cell_series(source);
        stats.interpolated += interpolate_series(&mut series, &days);
        table.set_cell_series(cell, &series);
        stats.rescued_cells += 1;
        debug!(
            "Rescued cell {} from {} ({:.1} km away)",
            table.cell_ids()[cell],
            table.cell_ids()[source],
            centers[cell].distance_km(&centers[source])
        );
    }

    stats.missing_after = table.missing_count();
    info!(
        "Global rescue: {} empty cells, {} rescued, {} values interpolated, {} still missing",
        stats.empty_cells, stats.rescued_cells, stats.interpolated, stats.missing_after
    );
    Ok(stats)
}

fn day_offsets(table: &ValueTable) -> Vec<i64> {
    let Some(&first) = table.dates().first() else {
        return Vec::new();
    };
    table
        .dates()
        .iter()
        .map(|date| date.signed_duration_since(first).num_days())
        .collect()
}

/// Linear interpolation of missing entries over `days`, anchored at the nearest
/// valid values on either side. Leading and trailing gaps take the nearest valid
/// value. Returns the number of entries filled.
pub fn interpolate_series(values: &mut [Option<f64>], days: &[i64]) -> usize {
    let anchors: Vec<usize> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    if anchors.is_empty() {
        return 0;
    }

    let mut filled = 0;
    for i in 0..values.len() {
        if values[i].is_some() {
            continue;
        }
        let next = anchors.partition_point(|&a| a < i);
        let after = anchors.get(next).copied();
        let before = next.checked_sub(1).map(|p| anchors[p]);
        let value = match (before, after) {
            (Some(b), Some(a)) => {
                let (vb, va) = (values[b].unwrap_or_default(), values[a].unwrap_or_default());
                let span = (days[a] - days[b]) as f64;
                if span > 0.0 {
                    vb + (va - vb) * (days[i] - days[b]) as f64 / span
                } else {
                    vb
                }
            }
            (Some(b), None) => values[b].unwrap_or_default(),
            (None, Some(a)) => values[a].unwrap_or_default(),
            (None, None) => continue,
        };
        values[i] = Some(value);
        filled += 1;
    }
    filled
}
