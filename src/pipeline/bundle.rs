use crate::fill::neighbors::NeighborRings;
use crate::geometry::hex_grid::HexGrid;
use crate::types::lat_lon::LatLon;
use std::sync::Arc;

/// Read-only grid data shared by every dataset task: cells with their sample
/// points, neighbor rings and centers.
#[derive(Debug, Clone)]
pub struct GridBundle {
    pub grid: HexGrid,
    pub rings: NeighborRings,
    pub centers: Vec<LatLon>,
    pub cell_ids: Arc<[String]>,
}

impl GridBundle {
    pub fn new(grid: HexGrid, max_k: usize) -> Self {
        let rings = NeighborRings::from_grid(&grid, max_k);
        let centers = grid.centers();
        let cell_ids = grid.ids().map(String::from).collect();
        Self {
            grid,
            rings,
            centers,
            cell_ids,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }
}
