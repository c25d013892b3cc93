//! Point data for interactive heat map renderers.

use crate::trips::error::OrderDataError;
use crate::types::lat_lon::LatLon;
use crate::types::order::EnrichedTripRecord;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A weighted heat map sample: the trip midpoint and its congestion weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

impl From<&EnrichedTripRecord> for HeatPoint {
    fn from(trip: &EnrichedTripRecord) -> Self {
        HeatPoint {
            lat: trip.mid_lat,
            lng: trip.mid_lng,
            weight: trip.congestion_weight,
        }
    }
}

pub fn heat_points(trips: &[EnrichedTripRecord]) -> Vec<HeatPoint> {
    trips.iter().map(HeatPoint::from).collect()
}

/// Mean midpoint of the batch, used to center a map. `None` for an empty batch.
pub fn map_center(trips: &[EnrichedTripRecord]) -> Option<LatLon> {
    if trips.is_empty() {
        return None;
    }
    let n = trips.len() as f64;
    let (lat_sum, lng_sum) = trips
        .iter()
        .map(EnrichedTripRecord::midpoint)
        .fold((0.0, 0.0), |(lat, lng), LatLon(mid_lat, mid_lng)| {
            (lat + mid_lat, lng + mid_lng)
        });
    Some(LatLon(lat_sum / n, lng_sum / n))
}

/// Everything an interactive heat map needs: where to center and what to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapLayer {
    pub center: Option<LatLon>,
    pub points: Vec<HeatPoint>,
}

impl HeatmapLayer {
    pub fn from_trips(trips: &[EnrichedTripRecord]) -> Self {
        if trips.is_empty() {
            warn!("Building a heat map layer from an empty trip batch");
        }
        Self {
            center: map_center(trips),
            points: heat_points(trips),
        }
    }

    pub fn to_json(&self) -> Result<String, OrderDataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), OrderDataError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| OrderDataError::WriteIo(path.to_path_buf(), e))?;
        info!(
            "Wrote heat map layer with {} points to {}",
            self.points.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(mid_lat: f64, mid_lng: f64, weight: f64) -> EnrichedTripRecord {
        EnrichedTripRecord {
            start_time: 0,
            end_time: 600,
            start_lng_wgs84: mid_lng,
            start_lat_wgs84: mid_lat,
            end_lng_wgs84: mid_lng,
            end_lat_wgs84: mid_lat,
            duration_min: 10.0,
            distance_km: 1.0,
            speed_kmh: 6.0,
            mid_lat,
            mid_lng,
            congestion_score: 34.0,
            congestion_weight: weight,
        }
    }

    #[test]
    fn test_heat_points_use_midpoint_and_weight() {
        let points = heat_points(&[trip(30.5, 104.0, 0.25), trip(30.7, 104.2, 1.0)]);
        assert_eq!(
            points,
            vec![
                HeatPoint {
                    lat: 30.5,
                    lng: 104.0,
                    weight: 0.25,
                },
                HeatPoint {
                    lat: 30.7,
                    lng: 104.2,
                    weight: 1.0,
                },
            ]
        );
    }

    #[test]
    fn test_map_center() {
        let center = map_center(&[trip(30.0, 104.0, 1.0), trip(31.0, 105.0, 1.0)]);
        assert_eq!(center, Some(LatLon(30.5, 104.5)));
        assert_eq!(map_center(&[]), None);
    }

    #[test]
    fn test_empty_layer_serializes() {
        let layer = HeatmapLayer::from_trips(&[]);
        assert_eq!(layer.to_json().unwrap(), r#"{"center":null,"points":[]}"#);
    }

    #[test]
    fn test_layer_json_shape() {
        let layer = HeatmapLayer::from_trips(&[trip(30.0, 104.0, 0.5)]);
        let value: serde_json::Value = serde_json::from_str(&layer.to_json().unwrap()).unwrap();
        assert_eq!(value["center"], serde_json::json!([30.0, 104.0]));
        assert_eq!(value["points"][0]["weight"], serde_json::json!(0.5));
    }
}
