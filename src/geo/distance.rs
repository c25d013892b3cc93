use crate::types::lat_lon::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};

/// Great-circle distance in kilometers between two WGS-84 points (haversine, R = 6371 km).
///
/// Identical points give exactly `0.0`.
pub fn haversine_km(from: LatLon, to: LatLon) -> f64 {
    distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    )
}
