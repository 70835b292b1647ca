//! Outward buffer of planar polygons, in projected (metric) coordinates.
//!
//! The buffer is the union of the shape with a disc around every vertex and a
//! band along every edge. Discs are polygons circumscribing the true circle, so
//! the result always covers every point within `distance` of the shape.

use geo::orient::{Direction, Orient};
use geo::{unary_union, Coord, LineString, MultiPolygon, Polygon, Simplify};
use std::f64::consts::PI;

const DISC_SEGMENTS: usize = 16;

/// Share of the buffer distance the rings may move when simplified first.
const SIMPLIFY_SHARE: f64 = 0.05;

/// Grows `shape` outward by `distance`. Non-positive distances return it unchanged.
pub fn buffer_metric(shape: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if distance.is_nan() || distance <= 0.0 {
        return shape.clone();
    }
    // Simplifying moves vertices by at most epsilon; growing the radius by the
    // same amount keeps the original shape covered.
    let epsilon = distance * SIMPLIFY_SHARE;
    let simplified = shape.simplify(&epsilon);
    let radius = distance + epsilon;

    let mut pieces: Vec<Polygon<f64>> = simplified
        .iter()
        .map(|polygon| polygon.orient(Direction::Default))
        .collect();
    for polygon in simplified.iter() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for line in ring.lines() {
                pieces.push(disc(line.start, radius));
                if let Some(band) = edge_band(line.start, line.end, radius) {
                    pieces.push(band);
                }
            }
        }
    }
    unary_union(pieces.iter())
}

fn disc(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    let outer = radius / (PI / DISC_SEGMENTS as f64).cos();
    let ring: Vec<Coord<f64>> = (0..DISC_SEGMENTS)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / DISC_SEGMENTS as f64;
            Coord {
                x: center.x + outer * angle.cos(),
                y: center.y + outer * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![]).orient(Direction::Default)
}

fn edge_band(start: Coord<f64>, end: Coord<f64>, radius: f64) -> Option<Polygon<f64>> {
    let (dx, dy) = (end.x - start.x, end.y - start.y);
    let length = dx.hypot(dy);
    if length == 0.0 {
        return None;
    }
    let offset = Coord {
        x: -dy / length * radius,
        y: dx / length * radius,
    };
    let ring = vec![start + offset, end + offset, end - offset, start - offset];
    Some(Polygon::new(LineString::from(ring), vec![]).orient(Direction::Default))
}
