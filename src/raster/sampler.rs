//! Three-tier extraction of one value per (cell, band).
//!
//! 1. the value at the cell centroid;
//! 2. the mean of the valid edge-midpoint values;
//! 3. the mean of the valid values at `n_random` points drawn uniformly inside the
//!    cell polygon by rejection sampling.
//!
//! Each tier reports an explicit [`TierOutcome`] so callers can audit where a value
//! came from or why it is absent.

use crate::geometry::hex_grid::Cell;
use crate::raster::stack::RasterStack;
use geo::{BoundingRect, Contains, Coord, Point, Polygon};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draw attempts per requested interior point before giving up.
pub const REJECTION_ATTEMPTS_PER_POINT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbsenceReason {
    /// Every read point was either no-data (`nodata`) or unreadable (`failed`).
    NoValidSample { nodata: usize, failed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierOutcome {
    Centroid(f64),
    EdgeMean(f64),
    InteriorMean(f64),
    Absent(AbsenceReason),
}

impl TierOutcome {
    pub fn value(&self) -> Option<f64> {
        match *self {
            TierOutcome::Centroid(v) | TierOutcome::EdgeMean(v) | TierOutcome::InteriorMean(v) => {
                Some(v)
            }
            TierOutcome::Absent(_) => None,
        }
    }
}

/// How many (cell, band) values each tier produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierStats {
    pub centroid: usize,
    pub edge_mean: usize,
    pub interior_mean: usize,
    pub absent: usize,
}

impl TierStats {
    pub fn record(&mut self, outcome: &TierOutcome) {
        match outcome {
            TierOutcome::Centroid(_) => self.centroid += 1,
            TierOutcome::EdgeMean(_) => self.edge_mean += 1,
            TierOutcome::InteriorMean(_) => self.interior_mean += 1,
            TierOutcome::Absent(_) => self.absent += 1,
        }
    }

    pub fn merge(&mut self, other: &TierStats) {
        self.centroid += other.centroid;
        self.edge_mean += other.edge_mean;
        self.interior_mean += other.interior_mean;
        self.absent += other.absent;
    }

    pub fn total(&self) -> usize {
        self.centroid + self.edge_mean + self.interior_mean + self.absent
    }
}

/// Sampled values of one stack, laid out `[band][cell]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSamples {
    pub values: Vec<Vec<Option<f64>>>,
    pub stats: TierStats,
}

/// Running mean over the valid reads of a point set.
#[derive(Debug, Default)]
struct Tally {
    sum: f64,
    valid: usize,
    nodata: usize,
    failed: usize,
}

impl Tally {
    fn read(&mut self, stack: &RasterStack, band: usize, point: Coord<f64>) {
        match stack.read(band, point.x, point.y) {
            Ok(Some(value)) => {
                self.sum += value;
                self.valid += 1;
            }
            Ok(None) => self.nodata += 1,
            Err(_) => self.failed += 1,
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.valid > 0).then(|| self.sum / self.valid as f64)
    }
}

pub struct CellSampler<R: Rng> {
    n_random: usize,
    rng: R,
}

impl CellSampler<StdRng> {
    /// Seeded sampler for reproducible runs; `None` seeds from entropy.
    pub fn seeded(n_random: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(n_random, rng)
    }
}

impl<R: Rng> CellSampler<R> {
    pub fn new(n_random: usize, rng: R) -> Self {
        Self { n_random, rng }
    }

    pub fn sample_band(&mut self, stack: &RasterStack, band: usize, cell: &Cell) -> TierOutcome {
        let mut seen = Tally::default();

        if let Some(centroid) = cell.sample_points.centroid() {
            let mut centroid_read = Tally::default();
            centroid_read.read(stack, band, centroid);
            if let Some(value) = centroid_read.mean() {
                return TierOutcome::Centroid(value);
            }
            seen.nodata += centroid_read.nodata;
            seen.failed += centroid_read.failed;
        }

        let mut edges = Tally::default();
        for &point in cell.sample_points.edge_midpoints() {
            edges.read(stack, band, point);
        }
        if let Some(value) = edges.mean() {
            return TierOutcome::EdgeMean(value);
        }
        seen.nodata += edges.nodata;
        seen.failed += edges.failed;

        let mut interior = Tally::default();
        for point in self.interior_points(&cell.polygon) {
            interior.read(stack, band, point);
        }
        if let Some(value) = interior.mean() {
            return TierOutcome::InteriorMean(value);
        }
        seen.nodata += interior.nodata;
        seen.failed += interior.failed;

        TierOutcome::Absent(AbsenceReason::NoValidSample {
            nodata: seen.nodata,
            failed: seen.failed,
        })
    }

    /// Samples every band of `stack` for every cell.
    pub fn sample_stack(&mut self, stack: &RasterStack, cells: &[Cell]) -> StackSamples {
        let mut stats = TierStats::default();
        let values = (0..stack.band_count())
            .map(|band| {
                cells
                    .iter()
                    .map(|cell| {
                        let outcome = self.sample_band(stack, band, cell);
                        stats.record(&outcome);
                        outcome.value()
                    })
                    .collect()
            })
            .collect();
        StackSamples { values, stats }
    }

    /// Up to `n_random` uniform points inside `polygon`. Gives up after
    /// `n_random * REJECTION_ATTEMPTS_PER_POINT` draws, so degenerate polygons
    /// yield fewer points.
    fn interior_points(&mut self, polygon: &Polygon<f64>) -> Vec<Coord<f64>> {
        let Some(bbox) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let (min, max) = (bbox.min(), bbox.max());
        let mut accepted = Vec::with_capacity(self.n_random);
        let mut attempts = 0;
        let max_attempts = self.n_random * REJECTION_ATTEMPTS_PER_POINT;

        while accepted.len() < self.n_random && attempts < max_attempts {
            attempts += 1;
            let candidate = Coord {
                x: self.rng.gen_range(min.x..=max.x),
                y: self.rng.gen_range(min.y..=max.y),
            };
            if polygon.contains(&Point::from(candidate)) {
                accepted.push(candidate);
            }
        }
        accepted
    }
}
