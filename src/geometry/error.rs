use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Failed to read boundary file '{0}'")]
    BoundaryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse GeoJSON from '{0}'")]
    GeoJsonParse(PathBuf, #[source] serde_json::Error),

    #[error("Malformed GeoJSON: {0}")]
    MalformedGeoJson(String),

    #[error("Unsupported geometry type '{0}', expected Polygon or MultiPolygon")]
    UnsupportedGeometry(String),

    #[error("No boundary feature has '{field}' in the configured admin names")]
    NoMatchingFeatures { field: String },

    // Fatal: nothing would be left to tessellate.
    #[error("No boundary part is larger than {threshold_km2} km²")]
    NoPartsAboveThreshold { threshold_km2: f64 },

    #[error("Invalid projection '{definition}': {message}")]
    InvalidProjection { definition: String, message: String },

    #[error("Coordinate transform failed: {0}")]
    Transform(String),

    #[error("Failed to tessellate boundary polygon")]
    Tiling(#[source] h3o::error::InvalidGeometry),

    #[error("Invalid cell id '{0}'")]
    InvalidCellId(String, #[source] h3o::error::InvalidCellIndex),

    #[error("Grid contains no cells")]
    EmptyGrid,

    #[error("Failed to read grid file '{0}'")]
    GridRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write grid file '{0}'")]
    GridWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode grid as GeoJSON")]
    GridEncode(#[source] serde_json::Error),
}
