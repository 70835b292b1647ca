//! Boundary loading and island cleaning.
//!
//! The raw administrative boundary usually carries many small offshore islands.
//! Cleaning explodes it into single parts in a metric CRS, drops every part whose
//! area does not exceed the threshold and dissolves the survivors into one geometry.

use crate::geometry::error::GeometryError;
use crate::geometry::geojson::parse_feature_collection;
use crate::geometry::projection::MetricProjection;
use geo::{unary_union, Area, MultiPolygon, Polygon};
use log::{debug, info};
use std::path::Path;

const M2_PER_KM2: f64 = 1e6;

/// Reads a GeoJSON FeatureCollection and keeps the features whose `admin_field`
/// is listed in `admin_names`. An empty `admin_names` keeps every feature.
pub fn load_boundary(
    path: &Path,
    admin_field: &str,
    admin_names: &[String],
) -> Result<MultiPolygon<f64>, GeometryError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GeometryError::BoundaryRead(path.to_path_buf(), e))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| GeometryError::GeoJsonParse(path.to_path_buf(), e))?;

    let features = parse_feature_collection(&document)?;
    let total = features.len();
    let kept: Vec<_> = features
        .into_iter()
        .filter(|feature| {
            admin_names.is_empty()
                || feature
                    .property_str(admin_field)
                    .is_some_and(|name| admin_names.iter().any(|n| n == name))
        })
        .collect();
    let kept_features = kept.len();
    let polygons: Vec<Polygon<f64>> = kept
        .into_iter()
        .flat_map(|feature| feature.geometry.0)
        .collect();

    if polygons.is_empty() {
        return Err(GeometryError::NoMatchingFeatures {
            field: admin_field.to_string(),
        });
    }
    info!(
        "Loaded boundary '{}': {} of {} features kept, {} polygon parts",
        path.display(),
        kept_features,
        total,
        polygons.len()
    );
    Ok(MultiPolygon::new(polygons))
}

/// Removes every part with an area of at most `min_area_km2` and dissolves the rest.
///
/// # Errors
///
/// Returns [`GeometryError::NoPartsAboveThreshold`] when nothing survives the filter.
pub fn clean_boundary(
    boundary: &MultiPolygon<f64>,
    min_area_km2: f64,
    projection: &MetricProjection,
) -> Result<MultiPolygon<f64>, GeometryError> {
    let metric = projection.to_metric(boundary)?;

    let kept: Vec<Polygon<f64>> = metric
        .0
        .into_iter()
        .filter(|part| {
            let area_km2 = part.unsigned_area() / M2_PER_KM2;
            let keep = area_km2 > min_area_km2;
            debug!(
                "Boundary part of {:.1} km² {}",
                area_km2,
                if keep { "kept" } else { "dropped" }
            );
            keep
        })
        .collect();

    if kept.is_empty() {
        return Err(GeometryError::NoPartsAboveThreshold {
            threshold_km2: min_area_km2,
        });
    }
    let kept_count = kept.len();

    let dissolved = unary_union(kept.iter());
    info!(
        "Cleaned boundary: {} of {} parts above {} km², {} after dissolve",
        kept_count,
        boundary.0.len(),
        min_area_km2,
        dissolved.0.len()
    );
    projection.to_geographic(&dissolved)
}
