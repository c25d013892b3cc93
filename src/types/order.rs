//! Row types flowing through the trip metrics pipeline.

use crate::types::lat_lon::LatLon;
use serde::{Deserialize, Serialize};

/// One ride-order observation as read from the source table.
///
/// Coordinates are in degrees, in GCJ-02 when the source is a Chinese map provider and in
/// WGS-84 otherwise (see [`crate::EngineConfig::assume_gcj02`]). `end_time > start_time` is
/// expected but not guaranteed; the pipeline drops rows where it does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawOrderRecord {
    /// Trip start, Unix seconds.
    pub start_time: i64,
    /// Trip end, Unix seconds.
    pub end_time: i64,
    pub start_lng: f64,
    pub start_lat: f64,
    pub end_lng: f64,
    pub end_lat: f64,
}

impl RawOrderRecord {
    pub fn start(&self) -> LatLon {
        LatLon(self.start_lat, self.start_lng)
    }

    pub fn end(&self) -> LatLon {
        LatLon(self.end_lat, self.end_lng)
    }
}

/// A validated trip with WGS-84 coordinates and derived metrics.
///
/// Every instance produced by [`crate::enrich_orders`] satisfies `duration_min > 0`,
/// `distance_km > 0.05` and a finite `speed_kmh`. `congestion_weight` is relative to the
/// batch the record was computed with, so the same trip can get different weights in
/// different batches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTripRecord {
    pub start_time: i64,
    pub end_time: i64,
    pub start_lng_wgs84: f64,
    pub start_lat_wgs84: f64,
    pub end_lng_wgs84: f64,
    pub end_lat_wgs84: f64,
    pub duration_min: f64,
    pub distance_km: f64,
    pub speed_kmh: f64,
    pub mid_lat: f64,
    pub mid_lng: f64,
    /// `40 - speed_kmh`, clamped to `[0, 40]`. Higher is slower.
    pub congestion_score: f64,
    /// `congestion_score` divided by the batch maximum, in `[0, 1]`.
    pub congestion_weight: f64,
}

impl EnrichedTripRecord {
    /// Representative location of the trip.
    pub fn midpoint(&self) -> LatLon {
        LatLon(self.mid_lat, self.mid_lng)
    }
}
