//! H3 hexagon grid covering the study region.
//!
//! The grid is built once per (boundary, resolution, buffer) and is immutable
//! afterwards. Cells are kept in ascending H3 index order, which makes the build
//! deterministic and gives every cell a stable integer handle (its position).

use crate::geometry::buffer::buffer_metric;
use crate::geometry::error::GeometryError;
use crate::geometry::projection::MetricProjection;
use crate::geometry::sample_points::{derive_sample_points, SamplePointSet};
use crate::types::lat_lon::LatLon;
use geo::{Coord, Intersects, LineString, MultiPolygon, Polygon};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, Resolution};
use log::info;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

/// One grid cell: stable id, hexagon boundary in lon/lat degrees and its sample points.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: String,
    pub index: CellIndex,
    pub polygon: Polygon<f64>,
    pub sample_points: SamplePointSet,
}

impl Cell {
    /// Builds a cell from its H3 index, using the full hexagon boundary.
    pub fn from_index(index: CellIndex) -> Self {
        Self::with_polygon(index, cell_polygon(index))
    }

    pub fn with_polygon(index: CellIndex, polygon: Polygon<f64>) -> Self {
        let sample_points = derive_sample_points(&polygon);
        Self {
            id: index.to_string(),
            index,
            polygon,
            sample_points,
        }
    }

    pub fn center(&self) -> LatLon {
        LatLon::from(self.index)
    }
}

/// Hexagon boundary of an H3 cell as a lon/lat polygon.
pub fn cell_polygon(index: CellIndex) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = index
        .boundary()
        .iter()
        .map(|vertex| Coord {
            x: vertex.lng(),
            y: vertex.lat(),
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

#[derive(Debug, Clone)]
pub struct HexGrid {
    cells: Vec<Cell>,
    positions: HashMap<CellIndex, usize>,
}

impl HexGrid {
    /// Tessellates `boundary` at `resolution` and keeps the cells touching it.
    ///
    /// The boundary is buffered outward by `buffer_m` meters before the polygon
    /// fill so that coastal cells are not lost, then every candidate hexagon is
    /// tested against the *unbuffered* boundary.
    pub fn build(
        boundary: &MultiPolygon<f64>,
        resolution: Resolution,
        buffer_m: f64,
        projection: &MetricProjection,
    ) -> Result<Self, GeometryError> {
        let metric = projection.to_metric(boundary)?;
        let buffered = projection.to_geographic(&buffer_metric(&metric, buffer_m))?;

        let mut tiler = TilerBuilder::new(resolution)
            .containment_mode(ContainmentMode::ContainsCentroid)
            .build();
        for polygon in buffered {
            tiler.add(polygon).map_err(GeometryError::Tiling)?;
        }
        let candidates: BTreeSet<CellIndex> = tiler.into_coverage().collect();
        let candidate_count = candidates.len();

        let cells: Vec<Cell> = candidates
            .into_iter()
            .map(Cell::from_index)
            .filter(|cell| cell.polygon.intersects(boundary))
            .collect();

        info!(
            "Hex grid at resolution {}: {} candidate cells after {:.1} m buffer, {} intersect the boundary",
            u8::from(resolution),
            candidate_count,
            buffer_m,
            cells.len()
        );
        Self::from_cells(cells)
    }

    /// Wraps prebuilt cells. Cells are sorted by index and deduplicated.
    pub fn from_cells(mut cells: Vec<Cell>) -> Result<Self, GeometryError> {
        if cells.is_empty() {
            return Err(GeometryError::EmptyGrid);
        }
        cells.sort_by_key(|cell| cell.index);
        cells.dedup_by_key(|cell| cell.index);
        let positions = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (cell.index, i))
            .collect();
        Ok(Self { cells, positions })
    }

    /// Builds a grid from H3 id strings, reconstructing each hexagon.
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> Result<Self, GeometryError> {
        let cells = ids
            .iter()
            .map(|id| parse_cell_id(id.as_ref()).map(Cell::from_index))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_cells(cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn position(&self, index: CellIndex) -> Option<usize> {
        self.positions.get(&index).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|cell| cell.id.as_str())
    }

    pub fn centers(&self) -> Vec<LatLon> {
        self.cells.iter().map(Cell::center).collect()
    }
}

pub fn parse_cell_id(id: &str) -> Result<CellIndex, GeometryError> {
    CellIndex::from_str(id).map_err(|e| GeometryError::InvalidCellId(id.to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_METRIC_PROJ;
    use h3o::LatLng;

    fn square(lon: f64, lat: f64, half: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (lon - half, lat - half),
                (lon + half, lat - half),
                (lon + half, lat + half),
                (lon - half, lat + half),
                (lon - half, lat - half),
            ]),
            vec![],
        )
    }

    fn build(boundary: &MultiPolygon<f64>, buffer_m: f64) -> HexGrid {
        let projection = MetricProjection::new(DEFAULT_METRIC_PROJ).unwrap();
        HexGrid::build(boundary, Resolution::Seven, buffer_m, &projection).unwrap()
    }

    #[test]
    fn every_cell_touches_the_boundary() {
        let boundary = MultiPolygon::new(vec![square(105.6, 10.0, 0.1)]);
        let grid = build(&boundary, 2441.2);

        assert!(grid.len() > 50);
        for cell in grid.cells() {
            assert!(cell.polygon.intersects(&boundary), "{} floats outside", cell.id);
            assert_eq!(cell.sample_points.len(), 7);
            assert_eq!(cell.index.resolution(), Resolution::Seven);
        }
    }

    #[test]
    fn buffer_recovers_edge_cells() {
        let boundary = MultiPolygon::new(vec![square(105.6, 10.0, 0.1)]);
        let plain = build(&boundary, 0.0);
        let buffered = build(&boundary, 2441.2);

        assert!(buffered.len() > plain.len(), "{} vs {}", buffered.len(), plain.len());
        for cell in plain.cells() {
            assert!(buffered.position(cell.index).is_some());
        }
        let added = buffered
            .cells()
            .iter()
            .filter(|cell| plain.position(cell.index).is_none());
        for cell in added {
            assert!(cell.polygon.intersects(&boundary), "{} floats outside", cell.id);
        }
    }

    #[test]
    fn build_is_deterministic() {
        let boundary = MultiPolygon::new(vec![square(105.6, 10.0, 0.08)]);
        let first: Vec<String> = build(&boundary, 1000.0).ids().map(String::from).collect();
        let second: Vec<String> = build(&boundary, 1000.0).ids().map(String::from).collect();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn from_ids_round_trips_and_rejects_garbage() {
        let cell = LatLng::new(10.0, 105.6).unwrap().to_cell(Resolution::Seven);
        let grid = HexGrid::from_ids(&[cell.to_string(), cell.to_string()]).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.position(cell), Some(0));

        let center = grid.cells()[0].center();
        assert!((center.latitude() - 10.0).abs() < 0.05);

        assert!(matches!(
            HexGrid::from_ids(&["not-a-cell"]),
            Err(GeometryError::InvalidCellId(..))
        ));
        assert!(matches!(
            HexGrid::from_ids::<&str>(&[]),
            Err(GeometryError::EmptyGrid)
        ));
    }
}
