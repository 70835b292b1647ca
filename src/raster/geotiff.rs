//! Loads a monthly GeoTIFF into a [`RasterStack`].
//!
//! Two layouts are accepted: a single image carrying one sample per day, stored
//! either pixel-interleaved or as separate planes, or one single-sample image
//! per day stored as consecutive pages. Images are decoded strip by strip (or
//! tile by tile). Georeferencing comes from the GeoTIFF model tags of the first
//! image and the no-data sentinel from the GDAL ascii tag.

use crate::raster::error::RasterError;
use crate::raster::stack::{GeoTransform, RasterStack};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::{PlanarConfiguration, Tag};

pub(crate) const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub(crate) const TAG_MODEL_TIEPOINT: u16 = 33922;
pub(crate) const TAG_MODEL_TRANSFORMATION: u16 = 34264;
pub(crate) const TAG_GDAL_NODATA: u16 = 42113;

pub(crate) fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

pub fn read_geotiff_stack(path: &Path) -> Result<RasterStack, RasterError> {
    let file = File::open(path).map_err(|e| RasterError::Open(path.to_path_buf(), e))?;
    let decode_err = |e| RasterError::Decode(path.to_path_buf(), e);

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(decode_err)?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let (width, height) = (width as usize, height as usize);
    let transform = read_transform(&mut decoder, path)?;
    let nodata = read_nodata(&mut decoder, path)?;

    let mut bands = read_image_bands(&mut decoder, path, width, height)?;
    while decoder.more_images() {
        decoder.next_image().map_err(decode_err)?;
        let (page_width, page_height) = decoder.dimensions().map_err(decode_err)?;
        if (page_width as usize, page_height as usize) != (width, height) {
            return Err(RasterError::BandLayout {
                band: bands.len(),
                width,
                height,
                expected: width * height,
                found: page_width as usize * page_height as usize,
            });
        }
        bands.extend(read_image_bands(&mut decoder, path, width, height)?);
    }

    debug!(
        "Read {} bands of {}x{} from {}",
        bands.len(),
        width,
        height,
        path.display()
    );
    RasterStack::new(width, height, transform, nodata, bands)
}

/// Decodes every sample of the current image into one row-major band per sample.
fn read_image_bands<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
    width: usize,
    height: usize,
) -> Result<Vec<Vec<f64>>, RasterError> {
    let decode_err = |e| RasterError::Decode(path.to_path_buf(), e);
    let samples = match decoder.find_tag(Tag::SamplesPerPixel).map_err(decode_err)? {
        Some(value) => (value.into_u32().map_err(decode_err)? as usize).max(1),
        None => 1,
    };
    let planar = match decoder.find_tag(Tag::PlanarConfiguration).map_err(decode_err)? {
        Some(value) => value.into_u16().map_err(decode_err)? == PlanarConfiguration::Planar.to_u16(),
        None => false,
    };
    // Planar images store each sample in its own run of chunks.
    let (planes, per_pixel) = if planar { (samples, 1) } else { (1, samples) };

    let (chunk_width, chunk_height) = decoder.chunk_dimensions();
    let (chunk_width, chunk_height) = (chunk_width as usize, chunk_height as usize);
    if chunk_width == 0 || chunk_height == 0 {
        return Err(RasterError::UnsupportedSampleFormat {
            path: path.to_path_buf(),
            format: format!("empty {chunk_width}x{chunk_height} chunks"),
        });
    }
    let across = width.div_ceil(chunk_width);
    let down = height.div_ceil(chunk_height);

    let mut bands = vec![vec![f64::NAN; width * height]; samples];
    for plane in 0..planes {
        for chunk_y in 0..down {
            for chunk_x in 0..across {
                let index = (plane * across * down + chunk_y * across + chunk_x) as u32;
                let (data_width, data_height) = decoder.chunk_data_dimensions(index);
                let (data_width, data_height) = (data_width as usize, data_height as usize);
                let chunk = decoder.read_chunk(index).map_err(decode_err)?;
                let values = decode_samples(chunk, path)?;
                let expected = data_width * data_height * per_pixel;
                if values.len() != expected {
                    return Err(RasterError::BandLayout {
                        band: plane,
                        width: data_width,
                        height: data_height,
                        expected,
                        found: values.len(),
                    });
                }

                for row in 0..data_height {
                    let y = chunk_y * chunk_height + row;
                    if y >= height {
                        break;
                    }
                    for col in 0..data_width {
                        let x = chunk_x * chunk_width + col;
                        if x >= width {
                            break;
                        }
                        let pixel = (row * data_width + col) * per_pixel;
                        for sample in 0..per_pixel {
                            bands[plane + sample][y * width + x] = values[pixel + sample];
                        }
                    }
                }
            }
        }
    }
    Ok(bands)
}

fn read_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<GeoTransform, RasterError> {
    let decode_err = |e| RasterError::Decode(path.to_path_buf(), e);
    let mut f64_tag = |code: u16| -> Result<Option<Vec<f64>>, RasterError> {
        decoder
            .find_tag(geo_tag(code))
            .map_err(decode_err)?
            .map(|value| value.into_f64_vec().map_err(decode_err))
            .transpose()
    };

    if let Some(matrix) = f64_tag(TAG_MODEL_TRANSFORMATION)? {
        if matrix.len() >= 8 && matrix[1] == 0.0 && matrix[4] == 0.0 {
            return Ok(GeoTransform {
                origin_x: matrix[3],
                origin_y: matrix[7],
                pixel_width: matrix[0],
                pixel_height: -matrix[5],
            });
        }
        warn!(
            "Ignoring rotated model transformation in {}",
            path.display()
        );
    }

    let scale = f64_tag(TAG_MODEL_PIXEL_SCALE)?;
    let tiepoint = f64_tag(TAG_MODEL_TIEPOINT)?;
    match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => Ok(GeoTransform {
            origin_x: tie[3] - tie[0] * scale[0],
            origin_y: tie[4] + tie[1] * scale[1],
            pixel_width: scale[0],
            pixel_height: scale[1],
        }),
        _ => Err(RasterError::MissingGeoreference(path.to_path_buf())),
    }
}

fn read_nodata<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<Option<f64>, RasterError> {
    let decode_err = |e| RasterError::Decode(path.to_path_buf(), e);
    let Some(value) = decoder
        .find_tag(geo_tag(TAG_GDAL_NODATA))
        .map_err(decode_err)?
    else {
        return Ok(None);
    };
    let text = value.into_string().map_err(decode_err)?;
    let text = text.trim_matches(char::from(0)).trim();
    match text.parse::<f64>() {
        Ok(nodata) => Ok(Some(nodata)),
        Err(_) => {
            warn!(
                "Unparsable no-data value '{}' in {}, treating only NaN as missing",
                text,
                path.display()
            );
            Ok(None)
        }
    }
}

fn decode_samples(result: DecodingResult, path: &Path) -> Result<Vec<f64>, RasterError> {
    #[allow(unreachable_patterns)]
    let values = match result {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        other => {
            return Err(RasterError::UnsupportedSampleFormat {
                path: path.to_path_buf(),
                format: format!("{other:?}"),
            })
        }
    };
    Ok(values)
}
