use h3o::{CellIndex, LatLng};
use haversine::{distance, Location as HaversineLocation, Units};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64` decimal degrees.
///
/// # Examples
///
/// ```
/// use hexfill::LatLon;
///
/// let can_tho = LatLon(10.0452, 105.7469);
/// assert_eq!(can_tho.0, 10.0452); // Latitude
/// assert_eq!(can_tho.1, 105.7469); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Great-circle distance in kilometers.
    pub fn distance_km(&self, other: &LatLon) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.0,
                longitude: self.1,
            },
            HaversineLocation {
                latitude: other.0,
                longitude: other.1,
            },
            Units::Kilometers,
        )
    }
}

impl From<LatLng> for LatLon {
    fn from(value: LatLng) -> Self {
        LatLon(value.lat(), value.lng())
    }
}

impl From<CellIndex> for LatLon {
    fn from(value: CellIndex) -> Self {
        LatLng::from(value).into()
    }
}
