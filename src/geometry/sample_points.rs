use geo::{Centroid, Coord, Polygon};

/// Canonical sampling points of one cell: the centroid followed by the midpoint of
/// every exterior edge in ring order.
///
/// A regular hexagon yields 7 points. Degenerate cells yield one midpoint per edge
/// they actually have.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePointSet {
    points: Vec<Coord<f64>>,
}

impl SamplePointSet {
    pub fn centroid(&self) -> Option<Coord<f64>> {
        self.points.first().copied()
    }

    pub fn edge_midpoints(&self) -> &[Coord<f64>] {
        self.points.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[Coord<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// `[centroid, mid(e0,e1), mid(e1,e2), …, mid(e5,e0)]` for a hexagon.
///
/// An empty polygon has no centroid and yields an empty set.
pub fn derive_sample_points(polygon: &Polygon<f64>) -> SamplePointSet {
    let Some(centroid) = polygon.centroid() else {
        return SamplePointSet { points: Vec::new() };
    };

    let mut points = Vec::with_capacity(polygon.exterior().0.len().max(1));
    points.push(centroid.0);
    points.extend(polygon.exterior().lines().map(|edge| Coord {
        x: (edge.start.x + edge.end.x) / 2.0,
        y: (edge.start.y + edge.end.y) / 2.0,
    }));
    SamplePointSet { points }
}
