//! The trip metrics pipeline: raw orders in, WGS-84 trips with a congestion signal out.
//!
//! Every step up to the congestion score is independent per record. The weight needs the
//! maximum score of the whole batch, so it is computed in a second pass once all records
//! have been scored.

use crate::geo::distance::haversine_km;
use crate::types::config::EngineConfig;
use crate::types::lat_lon::LatLon;
use crate::types::order::{EnrichedTripRecord, RawOrderRecord};
use log::debug;
use ordered_float::OrderedFloat;

/// Trips shorter than this (in km) are treated as GPS noise or stationary orders.
pub const MIN_DISTANCE_KM: f64 = 0.05;
/// Speed in km/h at or above which a trip scores zero congestion.
pub const FREE_FLOW_SPEED_KMH: f64 = 40.0;
/// Upper bound of the congestion score.
pub const MAX_CONGESTION_SCORE: f64 = 40.0;

/// Why a record was left out of the enriched batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    NonPositiveDuration,
    TooShort,
    NonFiniteSpeed,
}

/// Congestion score for a given speed: slower trips score higher, saturating at
/// [`MAX_CONGESTION_SCORE`] and flooring at zero for free-flowing traffic.
pub fn congestion_score(speed_kmh: f64) -> f64 {
    (FREE_FLOW_SPEED_KMH - speed_kmh).clamp(0.0, MAX_CONGESTION_SCORE)
}

/// Runs steps 1 to 6 of the pipeline on one record. The weight is left at zero.
pub(crate) fn score_record(
    record: &RawOrderRecord,
    assume_gcj02: bool,
) -> Result<EnrichedTripRecord, Rejection> {
    let (start, end) = if assume_gcj02 {
        (
            record.start().gcj02_to_wgs84(),
            record.end().gcj02_to_wgs84(),
        )
    } else {
        (record.start(), record.end())
    };

    let duration_min = record.end_time.saturating_sub(record.start_time) as f64 / 60.0;
    if duration_min <= 0.0 {
        return Err(Rejection::NonPositiveDuration);
    }

    let distance_km = haversine_km(start, end);
    // Written so that a NaN distance is rejected too.
    if !(distance_km > MIN_DISTANCE_KM) {
        return Err(Rejection::TooShort);
    }

    let speed_kmh = distance_km / (duration_min / 60.0);
    if !speed_kmh.is_finite() {
        return Err(Rejection::NonFiniteSpeed);
    }

    let LatLon(mid_lat, mid_lng) = start.midpoint(end);

    Ok(EnrichedTripRecord {
        start_time: record.start_time,
        end_time: record.end_time,
        start_lng_wgs84: start.1,
        start_lat_wgs84: start.0,
        end_lng_wgs84: end.1,
        end_lat_wgs84: end.0,
        duration_min,
        distance_km,
        speed_kmh,
        mid_lat,
        mid_lng,
        congestion_score: congestion_score(speed_kmh),
        congestion_weight: 0.0,
    })
}

/// Normalizes `congestion_score` by the batch maximum into `congestion_weight`.
///
/// A batch whose scores are all zero (or an empty batch) gets zero weights throughout.
pub(crate) fn apply_congestion_weights(trips: &mut [EnrichedTripRecord]) {
    let max_score = trips
        .iter()
        .map(|t| OrderedFloat(t.congestion_score))
        .max()
        .map(OrderedFloat::into_inner)
        .unwrap_or(0.0);

    for trip in trips.iter_mut() {
        trip.congestion_weight = if max_score > 0.0 {
            trip.congestion_score / max_score
        } else {
            0.0
        };
    }
}

/// Converts a batch of raw orders into enriched trips.
///
/// Records with a non-positive duration, a distance of at most [`MIN_DISTANCE_KM`] or a
/// non-finite speed are dropped silently; the output is in input order otherwise. The input
/// is never modified.
///
/// # Examples
///
/// ```
/// use urban_metrics::{enrich_orders, EngineConfig, RawOrderRecord};
///
/// let orders = [
///     // 0.9 km north in 6 minutes: 9 km/h.
///     RawOrderRecord {
///         start_time: 0,
///         end_time: 360,
///         start_lng: 10.0,
///         start_lat: 50.0,
///         end_lng: 10.0,
///         end_lat: 50.0081,
///     },
///     // Did not move: dropped.
///     RawOrderRecord {
///         start_time: 0,
///         end_time: 600,
///         start_lng: 10.0,
///         start_lat: 50.0,
///         end_lng: 10.0,
///         end_lat: 50.0,
///     },
/// ];
/// let trips = enrich_orders(&orders, &EngineConfig::default());
/// assert_eq!(trips.len(), 1);
/// assert_eq!(trips[0].congestion_weight, 1.0);
/// ```
pub fn enrich_orders(records: &[RawOrderRecord], config: &EngineConfig) -> Vec<EnrichedTripRecord> {
    let mut non_positive_duration = 0usize;
    let mut too_short = 0usize;
    let mut non_finite_speed = 0usize;

    let mut trips: Vec<EnrichedTripRecord> = records
        .iter()
        .filter_map(|record| match score_record(record, config.assume_gcj02) {
            Ok(trip) => Some(trip),
            Err(Rejection::NonPositiveDuration) => {
                non_positive_duration += 1;
                None
            }
            Err(Rejection::TooShort) => {
                too_short += 1;
                None
            }
            Err(Rejection::NonFiniteSpeed) => {
                non_finite_speed += 1;
                None
            }
        })
        .collect();

    apply_congestion_weights(&mut trips);

    debug!(
        "Enriched {} of {} orders ({} non-positive duration, {} under {} km, {} non-finite speed)",
        trips.len(),
        records.len(),
        non_positive_duration,
        too_short,
        MIN_DISTANCE_KM,
        non_finite_speed
    );
    trips
}
