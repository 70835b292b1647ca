//! Minimal GeoJSON reading and writing for the boundary input and the grid artifact.
//!
//! Only `Polygon` and `MultiPolygon` geometries are understood; coordinates are
//! `[lon, lat]` in WGS84 degrees.

use crate::geometry::error::GeometryError;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};

/// One feature: its polygons plus its raw property map.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: MultiPolygon<f64>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

pub fn parse_feature_collection(document: &Value) -> Result<Vec<Feature>, GeometryError> {
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| GeometryError::MalformedGeoJson("missing 'features' array".to_string()))?;

    features
        .iter()
        .map(|feature| {
            let geometry = feature.get("geometry").ok_or_else(|| {
                GeometryError::MalformedGeoJson("feature without geometry".to_string())
            })?;
            let properties = feature
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            Ok(Feature {
                geometry: parse_geometry(geometry)?,
                properties,
            })
        })
        .collect()
}

pub fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>, GeometryError> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| GeometryError::MalformedGeoJson("geometry without type".to_string()))?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| GeometryError::MalformedGeoJson("geometry without coordinates".to_string()))?;

    match kind {
        "Polygon" => Ok(MultiPolygon::new(vec![parse_polygon(coordinates)?])),
        "MultiPolygon" => {
            let parts = as_array(coordinates, "MultiPolygon coordinates")?;
            Ok(MultiPolygon::new(
                parts.iter().map(parse_polygon).collect::<Result<_, _>>()?,
            ))
        }
        other => Err(GeometryError::UnsupportedGeometry(other.to_string())),
    }
}

fn parse_polygon(rings: &Value) -> Result<Polygon<f64>, GeometryError> {
    let rings = as_array(rings, "polygon rings")?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings
        .next()
        .ok_or_else(|| GeometryError::MalformedGeoJson("polygon without rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>, GeometryError> {
    as_array(ring, "ring")?
        .iter()
        .map(|position| {
            let position = as_array(position, "position")?;
            match (
                position.first().and_then(Value::as_f64),
                position.get(1).and_then(Value::as_f64),
            ) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(GeometryError::MalformedGeoJson(
                    "position must hold two numbers".to_string(),
                )),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::from)
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, GeometryError> {
    value
        .as_array()
        .ok_or_else(|| GeometryError::MalformedGeoJson(format!("{what} must be an array")))
}

pub fn polygon_to_json(polygon: &Polygon<f64>) -> Value {
    let ring = |ls: &LineString<f64>| -> Vec<[f64; 2]> { ls.coords().map(|c| [c.x, c.y]).collect() };
    let mut rings = vec![ring(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring));
    json!({ "type": "Polygon", "coordinates": rings })
}
