use crate::geometry::error::GeometryError;
use geo::{Coord, MapCoords};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Round-trips geometries between WGS84 lon/lat degrees and a metric CRS.
///
/// Buffer distances and part areas are only meaningful in the metric CRS, while
/// H3 tessellation and everything downstream works in geographic coordinates.
pub struct MetricProjection {
    geographic: Proj,
    metric: Proj,
    definition: String,
}

impl std::fmt::Debug for MetricProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricProjection")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl MetricProjection {
    pub fn new(definition: &str) -> Result<Self, GeometryError> {
        let invalid = |e: proj4rs::errors::Error| GeometryError::InvalidProjection {
            definition: definition.to_string(),
            message: format!("{e:?}"),
        };
        Ok(Self {
            geographic: Proj::from_proj_string(WGS84_PROJ).map_err(invalid)?,
            metric: Proj::from_proj_string(definition).map_err(invalid)?,
            definition: definition.to_string(),
        })
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// lon/lat degrees to metric x/y.
    pub fn forward(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
        let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.0);
        transform(&self.geographic, &self.metric, &mut point)
            .map_err(|e| GeometryError::Transform(format!("{e:?}")))?;
        Ok(Coord {
            x: point.0,
            y: point.1,
        })
    }

    /// Metric x/y to lon/lat degrees.
    pub fn inverse(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeometryError> {
        let mut point = (coord.x, coord.y, 0.0);
        transform(&self.metric, &self.geographic, &mut point)
            .map_err(|e| GeometryError::Transform(format!("{e:?}")))?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    pub fn to_metric<G>(&self, geometry: &G) -> Result<G::Output, GeometryError>
    where
        G: MapCoords<f64, f64>,
    {
        geometry.try_map_coords(|c| self.forward(c))
    }

    pub fn to_geographic<G>(&self, geometry: &G) -> Result<G::Output, GeometryError>
    where
        G: MapCoords<f64, f64>,
    {
        geometry.try_map_coords(|c| self.inverse(c))
    }
}
