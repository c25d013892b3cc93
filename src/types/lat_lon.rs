use crate::geo::gcj02::gcj02_to_wgs84;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64` degrees.
///
/// # Examples
///
/// ```
/// use urban_metrics::LatLon;
///
/// let chengdu = LatLon(30.657, 104.066);
/// assert_eq!(chengdu.0, 30.657); // Latitude
/// assert_eq!(chengdu.1, 104.066); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Interprets this point as GCJ-02 and converts it to WGS-84.
    ///
    /// See [`crate::gcj02_to_wgs84`] for the conversion rules.
    pub fn gcj02_to_wgs84(self) -> LatLon {
        let (lng, lat) = gcj02_to_wgs84(self.1, self.0);
        LatLon(lat, lng)
    }

    /// Arithmetic midpoint of two coordinates.
    ///
    /// Good enough for the few-kilometer spans of city trips; not a great-circle midpoint.
    pub fn midpoint(self, other: LatLon) -> LatLon {
        LatLon((self.0 + other.0) / 2.0, (self.1 + other.1) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcj02_conversion_keeps_axis_order() {
        let converted = LatLon(39.915, 116.404).gcj02_to_wgs84();
        let (lng, lat) = gcj02_to_wgs84(116.404, 39.915);
        assert_eq!(converted, LatLon(lat, lng));
    }

    #[test]
    fn test_midpoint() {
        let mid = LatLon(30.0, 104.0).midpoint(LatLon(31.0, 105.0));
        assert_eq!(mid, LatLon(30.5, 104.5));
    }
}
