//! GeoJSON persistence of the grid artifact: one `Polygon` feature per cell with
//! its H3 id in the `h3_index` property.

use crate::geometry::error::GeometryError;
use crate::geometry::geojson::{parse_feature_collection, polygon_to_json};
use crate::geometry::hex_grid::{parse_cell_id, Cell, HexGrid};
use crate::types::value_table::COL_CELL;
use crate::utils::write_atomically;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;

pub fn write_grid_geojson(grid: &HexGrid, path: &Path) -> Result<(), GeometryError> {
    let features: Vec<Value> = grid
        .cells()
        .iter()
        .map(|cell| {
            json!({
                "type": "Feature",
                "properties": { COL_CELL: cell.id },
                "geometry": polygon_to_json(&cell.polygon),
            })
        })
        .collect();
    let document = json!({ "type": "FeatureCollection", "features": features });
    let bytes = serde_json::to_vec(&document).map_err(GeometryError::GridEncode)?;

    write_atomically(path, |file| file.write_all(&bytes))
        .map_err(|e| GeometryError::GridWrite(path.to_path_buf(), e))?;
    log::info!("Wrote {} grid cells to {}", grid.len(), path.display());
    Ok(())
}

/// Reads a grid artifact. The stored polygon is kept as-is; only its first part is
/// used when a feature carries a MultiPolygon.
pub fn read_grid_geojson(path: &Path) -> Result<HexGrid, GeometryError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| GeometryError::GridRead(path.to_path_buf(), e))?;
    let document: Value = serde_json::from_str(&text)
        .map_err(|e| GeometryError::GeoJsonParse(path.to_path_buf(), e))?;

    let cells = parse_feature_collection(&document)?
        .into_iter()
        .map(|feature| {
            let id = feature
                .property_str(COL_CELL)
                .map(str::to_owned)
                .ok_or_else(|| {
                    GeometryError::MalformedGeoJson(format!("feature without '{COL_CELL}'"))
                })?;
            let index = parse_cell_id(&id)?;
            let polygon = feature.geometry.0.into_iter().next().ok_or_else(|| {
                GeometryError::MalformedGeoJson(format!("cell {id} has no polygon"))
            })?;
            Ok(Cell::with_polygon(index, polygon))
        })
        .collect::<Result<Vec<_>, GeometryError>>()?;

    HexGrid::from_cells(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::{LatLng, Resolution};

    #[test]
    fn grid_round_trips_through_geojson() {
        let origin = LatLng::new(10.0, 105.6).unwrap().to_cell(Resolution::Seven);
        let ids: Vec<String> = origin
            .grid_disk::<Vec<_>>(2)
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        let grid = HexGrid::from_ids(&ids).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.geojson");
        write_grid_geojson(&grid, &path).unwrap();
        let loaded = read_grid_geojson(&path).unwrap();

        assert_eq!(loaded.len(), 19);
        assert_eq!(
            loaded.ids().collect::<Vec<_>>(),
            grid.ids().collect::<Vec<_>>()
        );
        for (a, b) in loaded.cells().iter().zip(grid.cells()) {
            assert_eq!(a.sample_points.len(), b.sample_points.len());
        }
    }

    #[test]
    fn features_without_id_or_polygon_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.geojson");
        let cell = LatLng::new(10.0, 105.6).unwrap().to_cell(Resolution::Seven);

        std::fs::write(
            &path,
            format!(
                r#"{{"type": "FeatureCollection", "features": [
                    {{"type": "Feature", "properties": {{"h3_index": "{cell}"}},
                      "geometry": {{"type": "MultiPolygon", "coordinates": []}}}}
                ]}}"#
            ),
        )
        .unwrap();
        let err = read_grid_geojson(&path).unwrap_err();
        assert!(
            matches!(&err, GeometryError::MalformedGeoJson(m) if m.contains(&cell.to_string())),
            "{err}"
        );

        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            read_grid_geojson(&path),
            Err(GeometryError::MalformedGeoJson(_))
        ));
    }

    #[test]
    fn missing_grid_file_is_reported() {
        let err = read_grid_geojson(Path::new("/no/such/grid.geojson")).unwrap_err();
        assert!(matches!(err, GeometryError::GridRead(..)));
    }
}
