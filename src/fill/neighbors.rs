//! Precomputed neighborhoods of every grid cell, built once from grid topology and
//! shared read-only by every date and dataset.
//!
//! Cells are addressed by their position in the grid. `disk(cell, k)` returns every
//! other grid cell within `k` adjacency steps, nearest rings first.

use crate::geometry::hex_grid::HexGrid;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRings {
    max_k: usize,
    /// Per cell, neighbor positions ordered by grid distance then position.
    neighbors: Vec<Vec<usize>>,
    /// Per cell, `ends[c][k - 1]` is how many entries of `neighbors[c]` lie within `k` steps.
    ends: Vec<Vec<usize>>,
}

impl NeighborRings {
    /// Uses the H3 grid distance. Neighbors outside the grid are left out.
    pub fn from_grid(grid: &HexGrid, max_k: usize) -> Self {
        let by_distance = grid
            .cells()
            .iter()
            .map(|cell| {
                cell.index
                    .grid_disk_distances::<Vec<_>>(max_k as u32)
                    .into_iter()
                    .filter(|&(_, distance)| distance > 0)
                    .filter_map(|(index, distance)| {
                        grid.position(index).map(|pos| (distance as usize, pos))
                    })
                    .collect()
            })
            .collect();
        Self::from_distances(max_k, by_distance)
    }

    /// Breadth-first rings over an explicit adjacency list.
    pub fn from_adjacency(adjacency: &[Vec<usize>], max_k: usize) -> Self {
        let by_distance = (0..adjacency.len())
            .map(|start| {
                let mut depth = vec![usize::MAX; adjacency.len()];
                depth[start] = 0;
                let mut queue = VecDeque::from([start]);
                let mut found = Vec::new();
                while let Some(current) = queue.pop_front() {
                    if depth[current] == max_k {
                        continue;
                    }
                    for &next in &adjacency[current] {
                        if next < adjacency.len() && depth[next] == usize::MAX {
                            depth[next] = depth[current] + 1;
                            found.push((depth[next], next));
                            queue.push_back(next);
                        }
                    }
                }
                found
            })
            .collect();
        Self::from_distances(max_k, by_distance)
    }

    fn from_distances(max_k: usize, by_distance: Vec<Vec<(usize, usize)>>) -> Self {
        let mut neighbors = Vec::with_capacity(by_distance.len());
        let mut ends = Vec::with_capacity(by_distance.len());
        for mut found in by_distance {
            found.sort_unstable();
            found.dedup();
            ends.push(
                (1..=max_k)
                    .map(|k| found.partition_point(|&(distance, _)| distance <= k))
                    .collect(),
            );
            neighbors.push(found.into_iter().map(|(_, pos)| pos).collect());
        }
        Self {
            max_k,
            neighbors,
            ends,
        }
    }

    pub fn max_k(&self) -> usize {
        self.max_k
    }

    pub fn cell_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Cells within `k` steps of `cell`, excluding `cell` itself. `k` is clamped
    /// to `max_k`; `k == 0` is empty.
    pub fn disk(&self, cell: usize, k: usize) -> &[usize] {
        let k = k.min(self.max_k);
        if k == 0 {
            return &[];
        }
        &self.neighbors[cell][..self.ends[cell][k - 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::{LatLng, Resolution};

    /// 8-connected adjacency of a `side x side` square lattice, row-major.
    fn lattice(side: usize) -> Vec<Vec<usize>> {
        let side = side as i64;
        let mut adjacency = Vec::new();
        for row in 0..side {
            for col in 0..side {
                let mut near = Vec::new();
                for r in row - 1..=row + 1 {
                    for c in col - 1..=col + 1 {
                        let inside = (0..side).contains(&r) && (0..side).contains(&c);
                        if inside && (r, c) != (row, col) {
                            near.push((r * side + c) as usize);
                        }
                    }
                }
                adjacency.push(near);
            }
        }
        adjacency
    }

    #[test]
    fn h3_rings_grow_by_six_per_step() {
        let origin = LatLng::new(10.0, 105.6).unwrap().to_cell(Resolution::Seven);
        let ids: Vec<String> = origin
            .grid_disk::<Vec<_>>(3)
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        let grid = HexGrid::from_ids(&ids).unwrap();
        let rings = NeighborRings::from_grid(&grid, 2);
        let center = grid.position(origin).unwrap();

        assert_eq!(rings.disk(center, 0).len(), 0);
        assert_eq!(rings.disk(center, 1).len(), 6);
        assert_eq!(rings.disk(center, 2).len(), 18);
        assert_eq!(rings.disk(center, 5).len(), 18);
        assert!(!rings.disk(center, 2).contains(&center));
    }

    #[test]
    fn h3_rings_skip_cells_outside_the_grid() {
        let origin = LatLng::new(10.0, 105.6).unwrap().to_cell(Resolution::Seven);
        let ids: Vec<String> = origin
            .grid_disk::<Vec<_>>(1)
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        let grid = HexGrid::from_ids(&ids).unwrap();
        let rings = NeighborRings::from_grid(&grid, 3);

        for cell in 0..grid.len() {
            assert!(rings.disk(cell, 3).len() <= 6);
            assert!(rings.disk(cell, 3).iter().all(|&n| n < grid.len() && n != cell));
        }
    }

    #[test]
    fn adjacency_rings_expand_breadth_first() {
        let rings = NeighborRings::from_adjacency(&lattice(5), 2);
        // Corner (0, 0).
        assert_eq!(rings.disk(0, 1), &[1, 5, 6]);
        assert_eq!(rings.disk(0, 2).len(), 8);
        // Center (2, 2) sees the whole lattice at k = 2.
        assert_eq!(rings.disk(12, 1).len(), 8);
        assert_eq!(rings.disk(12, 2).len(), 24);
        assert_eq!(rings.cell_count(), 25);
    }
}
