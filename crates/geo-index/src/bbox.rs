use geotag::{Dms, GeoPosition};
use serde::{Deserialize, Serialize};

/// Latitude/longitude range for spatial queries, in signed decimal degrees.
///
/// Bounds are inclusive. There is no antimeridian handling: a box whose
/// `lon_start` is greater than its `lon_end` matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_start: f64,
    pub lat_end: f64,
    pub lon_start: f64,
    pub lon_end: f64,
}

impl BoundingBox {
    pub fn new(lat_start: f64, lat_end: f64, lon_start: f64, lon_end: f64) -> Self {
        Self {
            lat_start,
            lat_end,
            lon_start,
            lon_end,
        }
    }

    /// Build a box from the four DMS bounds of a coordinate query
    pub fn from_dms(lat_start: &Dms, lat_end: &Dms, lon_start: &Dms, lon_end: &Dms) -> Self {
        Self::new(
            lat_start.to_decimal(),
            lat_end.to_decimal(),
            lon_start.to_decimal(),
            lon_end.to_decimal(),
        )
    }

    /// Box covering every valid position
    pub fn world() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    pub fn contains(&self, position: &GeoPosition) -> bool {
        self.lat_start <= position.latitude
            && position.latitude <= self.lat_end
            && self.lon_start <= position.longitude
            && position.longitude <= self.lon_end
    }
}
