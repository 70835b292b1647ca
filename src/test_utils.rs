//! Fixtures shared by the unit tests of several modules.

use crate::geometry::hex_grid::HexGrid;
use crate::raster::geotiff::{geo_tag, TAG_GDAL_NODATA, TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT};
use crate::raster::stack::GeoTransform;
use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use h3o::{CellIndex, LatLng, Resolution};
use std::fs::File;
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};

/// Writes one single-sample `f32` page per band, georeferenced on the first page.
pub fn write_geotiff(
    path: &Path,
    width: u32,
    height: u32,
    transform: GeoTransform,
    nodata: Option<&str>,
    bands: &[Vec<f32>],
) {
    let file = File::create(path).unwrap();
    let mut tiff = TiffEncoder::new(file).unwrap();
    for (i, band) in bands.iter().enumerate() {
        let mut image = tiff
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();
        if i == 0 {
            let encoder = image.encoder();
            encoder
                .write_tag(
                    geo_tag(TAG_MODEL_PIXEL_SCALE),
                    &[transform.pixel_width, transform.pixel_height, 0.0][..],
                )
                .unwrap();
            encoder
                .write_tag(
                    geo_tag(TAG_MODEL_TIEPOINT),
                    &[0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0][..],
                )
                .unwrap();
            if let Some(nodata) = nodata {
                encoder.write_tag(geo_tag(TAG_GDAL_NODATA), nodata).unwrap();
            }
        }
        image.write_data(band).unwrap();
    }
}

/// Writes a single uncompressed little-endian image with one `f32` sample per
/// band, laid out pixel-interleaved or as one plane per band.
pub fn write_multiband_geotiff(
    path: &Path,
    width: u32,
    height: u32,
    transform: GeoTransform,
    nodata: Option<&str>,
    bands: &[Vec<f32>],
    planar: bool,
) {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const ASCII: u16 = 2;
    const DOUBLE: u16 = 12;

    let samples = bands.len() as u16;
    let pixels = (width * height) as usize;
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    let mut counts = Vec::new();
    if planar {
        for band in bands {
            offsets.push(8 + data.len() as u32);
            counts.push((pixels * 4) as u32);
            data.extend(band.iter().flat_map(|v| v.to_le_bytes()));
        }
    } else {
        offsets.push(8);
        counts.push((pixels * bands.len() * 4) as u32);
        for pixel in 0..pixels {
            data.extend(bands.iter().flat_map(|band| band[pixel].to_le_bytes()));
        }
    }

    let shorts = |values: &[u16]| values.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();
    let longs = |values: &[u32]| values.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();
    let doubles = |values: &[f64]| values.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();
    let n = samples as usize;
    let mut entries: Vec<(u16, u16, u32, Vec<u8>)> = vec![
        (256, LONG, 1, longs(&[width])),
        (257, LONG, 1, longs(&[height])),
        (258, SHORT, samples as u32, shorts(&vec![32; n])),
        (259, SHORT, 1, shorts(&[1])),
        (262, SHORT, 1, shorts(&[1])),
        (273, LONG, offsets.len() as u32, longs(&offsets)),
        (277, SHORT, 1, shorts(&[samples])),
        (278, LONG, 1, longs(&[height])),
        (279, LONG, counts.len() as u32, longs(&counts)),
        (284, SHORT, 1, shorts(&[if planar { 2 } else { 1 }])),
        (339, SHORT, samples as u32, shorts(&vec![3; n])),
        (33550, DOUBLE, 3, doubles(&[transform.pixel_width, transform.pixel_height, 0.0])),
        (
            33922,
            DOUBLE,
            6,
            doubles(&[0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0]),
        ),
    ];
    if let Some(nodata) = nodata {
        let mut text = nodata.as_bytes().to_vec();
        text.push(0);
        entries.push((42113, ASCII, text.len() as u32, text));
    }

    // Values longer than four bytes live between the pixel data and the directory.
    let mut extra = Vec::new();
    let extra_start = 8 + data.len();
    let mut directory = (entries.len() as u16).to_le_bytes().to_vec();
    for (tag, kind, count, value) in &entries {
        directory.extend(tag.to_le_bytes());
        directory.extend(kind.to_le_bytes());
        directory.extend(count.to_le_bytes());
        if value.len() <= 4 {
            let mut inline = value.clone();
            inline.resize(4, 0);
            directory.extend(inline);
        } else {
            directory.extend(((extra_start + extra.len()) as u32).to_le_bytes());
            extra.extend(value);
            if extra.len() % 2 == 1 {
                extra.push(0);
            }
        }
    }
    directory.extend(0u32.to_le_bytes());

    let mut bytes = b"II".to_vec();
    bytes.extend(42u16.to_le_bytes());
    bytes.extend(((extra_start + extra.len()) as u32).to_le_bytes());
    bytes.extend(data);
    bytes.extend(extra);
    bytes.extend(directory);
    std::fs::write(path, bytes).unwrap();
}

pub fn origin_cell() -> CellIndex {
    LatLng::new(10.0, 105.6).unwrap().to_cell(Resolution::Seven)
}

/// Every resolution-7 cell within `k` steps of [`origin_cell`].
pub fn disk_grid(k: u32) -> HexGrid {
    let ids: Vec<String> = origin_cell()
        .grid_disk::<Vec<_>>(k)
        .into_iter()
        .map(|c| c.to_string())
        .collect();
    HexGrid::from_ids(&ids).unwrap()
}

/// Pixel size of [`write_over_grid`] rasters, in degrees.
pub const GRID_PIXEL: f64 = 0.002;

/// Writes `bands` pages covering `grid` with a one pixel margin and `-9999` as
/// no-data. `value(band, pixel)` gives each pixel's value.
pub fn write_over_grid(
    path: &Path,
    grid: &HexGrid,
    bands: usize,
    value: impl Fn(usize, Rect<f64>) -> f32,
) {
    let footprint = MultiPolygon::new(grid.cells().iter().map(|c| c.polygon.clone()).collect());
    let bbox = footprint.bounding_rect().unwrap();
    let transform = GeoTransform {
        origin_x: bbox.min().x - GRID_PIXEL,
        origin_y: bbox.max().y + GRID_PIXEL,
        pixel_width: GRID_PIXEL,
        pixel_height: GRID_PIXEL,
    };
    let width = (bbox.width() / GRID_PIXEL).ceil() as u32 + 2;
    let height = (bbox.height() / GRID_PIXEL).ceil() as u32 + 2;

    let pages: Vec<Vec<f32>> = (0..bands)
        .map(|band| {
            (0..height)
                .flat_map(|row| (0..width).map(move |col| (col, row)))
                .map(|(col, row)| {
                    let x = transform.origin_x + col as f64 * GRID_PIXEL;
                    let y = transform.origin_y - row as f64 * GRID_PIXEL;
                    let pixel = Rect::new(
                        Coord { x, y: y - GRID_PIXEL },
                        Coord {
                            x: x + GRID_PIXEL,
                            y,
                        },
                    );
                    value(band, pixel)
                })
                .collect()
        })
        .collect();
    write_geotiff(path, width, height, transform, Some("-9999"), &pages);
}
