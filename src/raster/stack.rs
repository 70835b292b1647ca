//! In-memory multi-band raster: one band per calendar day of a month.

use crate::raster::error::{RasterError, SampleError};

/// Relative and absolute tolerance used to recognise the no-data sentinel.
pub const NODATA_TOLERANCE: f64 = 1e-9;

/// North-up affine georeference: pixel (col, row) covers
/// `[origin_x + col * pixel_width, origin_x + (col + 1) * pixel_width)` horizontally and
/// `(origin_y - (row + 1) * pixel_height, origin_y - row * pixel_height]` vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Fractional (col, row) of a map coordinate.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (self.origin_y - y) / self.pixel_height,
        )
    }
}

/// `true` when `value` must be treated as "no observation".
///
/// NaN is always absent. Otherwise the value is compared to the declared sentinel
/// with `|a - b| <= max(rel * max(|a|, |b|), abs)`, inclusive at the boundary.
pub fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    let Some(nodata) = nodata else {
        return false;
    };
    if nodata.is_nan() {
        return false;
    }
    let tolerance = (NODATA_TOLERANCE * value.abs().max(nodata.abs())).max(NODATA_TOLERANCE);
    (value - nodata).abs() <= tolerance
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterStack {
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: Option<f64>,
    bands: Vec<Vec<f64>>,
}

impl RasterStack {
    /// Every band must hold exactly `width * height` row-major pixels.
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
        bands: Vec<Vec<f64>>,
    ) -> Result<Self, RasterError> {
        if bands.is_empty() {
            return Err(RasterError::EmptyStack);
        }
        let expected = width * height;
        if let Some((band, data)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(RasterError::BandLayout {
                band,
                width,
                height,
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            transform,
            nodata,
            bands,
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Reads band `band` at map coordinate (x, y). `Ok(None)` is a no-data pixel.
    pub fn read(&self, band: usize, x: f64, y: f64) -> Result<Option<f64>, SampleError> {
        let data = self.bands.get(band).ok_or(SampleError::BandOutOfRange {
            band,
            count: self.bands.len(),
        })?;
        let (col, row) = self.transform.to_pixel(x, y);
        let (col, row) = (col.floor(), row.floor());
        if !(col >= 0.0 && row >= 0.0 && col < self.width as f64 && row < self.height as f64) {
            return Err(SampleError::OutOfExtent { x, y });
        }
        let value = data[row as usize * self.width + col as usize];
        Ok((!is_nodata(value, self.nodata)).then_some(value))
    }
}
