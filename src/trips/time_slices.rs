//! Splits a trip batch into local-time buckets for animated heat maps.

use crate::trips::error::OrderDataError;
use crate::trips::heatmap::HeatPoint;
use crate::types::config::EngineConfig;
use crate::types::order::EnrichedTripRecord;
use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use log::{debug, warn};
use std::collections::BTreeMap;

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One frame of a time-sliced heat map.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlice {
    /// Start of the bucket in the configured local timezone.
    pub start: DateTime<Tz>,
    /// `start` formatted as `YYYY-MM-DD HH:MM`.
    pub label: String,
    pub points: Vec<HeatPoint>,
}

/// Longest daylight-saving gap searched when a bucket starts at a skipped wall time.
const MAX_DST_GAP_MINUTES: i64 = 24 * 60;

/// Resolves a local wall time to an instant.
///
/// Ambiguous times (clocks turned back) take the earlier instant. Times skipped by a
/// clock change resolve to the first instant after the gap.
fn resolve_wall_time(wall: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    (0..=MAX_DST_GAP_MINUTES).find_map(|minutes| {
        tz.from_local_datetime(&(wall + TimeDelta::minutes(minutes)))
            .earliest()
    })
}

/// Floors a Unix timestamp to the start of its bucket, measured in local wall-clock time.
///
/// Buckets are aligned to local midnight rather than to the Unix epoch, so a one-day
/// granularity in `Asia/Shanghai` yields buckets starting at 00:00 CST.
fn bucket_start(timestamp: i64, granularity_secs: i64, tz: Tz) -> Option<DateTime<Tz>> {
    let local = DateTime::from_timestamp(timestamp, 0)?.with_timezone(&tz);
    let wall_secs = local.naive_local().and_utc().timestamp();
    let floored = wall_secs - wall_secs.rem_euclid(granularity_secs);
    let floored_wall = DateTime::from_timestamp(floored, 0)?.naive_utc();
    resolve_wall_time(floored_wall, tz)
}

/// Groups trips by the local-time bucket of their `start_time`.
///
/// Buckets holding fewer than `config.min_samples` trips are skipped. The result is ordered by
/// bucket start and is empty when the input is empty or every bucket is too sparse.
///
/// # Errors
///
/// Returns [`OrderDataError::InvalidGranularity`] if `config.granularity` is shorter than one
/// second.
pub fn time_slices(
    trips: &[EnrichedTripRecord],
    config: &EngineConfig,
) -> Result<Vec<TimeSlice>, OrderDataError> {
    let granularity_secs = config.granularity.num_seconds();
    if granularity_secs <= 0 {
        return Err(OrderDataError::InvalidGranularity(granularity_secs));
    }

    let mut buckets: BTreeMap<DateTime<Tz>, Vec<HeatPoint>> = BTreeMap::new();
    for trip in trips {
        match bucket_start(trip.start_time, granularity_secs, config.timezone) {
            Some(start) => buckets.entry(start).or_default().push(HeatPoint::from(trip)),
            None => warn!(
                "Could not place trip starting at {} into a {} bucket",
                trip.start_time, config.timezone
            ),
        }
    }

    let total_buckets = buckets.len();
    let slices: Vec<TimeSlice> = buckets
        .into_iter()
        .filter(|(_, points)| points.len() >= config.min_samples)
        .map(|(start, points)| TimeSlice {
            label: start.format(LABEL_FORMAT).to_string(),
            start,
            points,
        })
        .collect();

    debug!(
        "Kept {} of {} time buckets with at least {} trips",
        slices.len(),
        total_buckets,
        config.min_samples
    );
    if slices.is_empty() && total_buckets > 0 {
        warn!(
            "Every time bucket has fewer than {} trips; no time slices produced",
            config.min_samples
        );
    }
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2016-11-01 08:00:00 in Asia/Shanghai.
    const NOV_1_0800_CST: i64 = 1_477_958_400;

    fn trip_at(start_time: i64) -> EnrichedTripRecord {
        EnrichedTripRecord {
            start_time,
            end_time: start_time + 600,
            start_lng_wgs84: 104.06,
            start_lat_wgs84: 30.65,
            end_lng_wgs84: 104.08,
            end_lat_wgs84: 30.67,
            duration_min: 10.0,
            distance_km: 2.9,
            speed_kmh: 17.4,
            mid_lat: 30.66,
            mid_lng: 104.07,
            congestion_score: 22.6,
            congestion_weight: 1.0,
        }
    }

    fn config(min_samples: usize, granularity: TimeDelta) -> EngineConfig {
        EngineConfig::builder()
            .min_samples(min_samples)
            .granularity(granularity)
            .build()
    }

    #[test]
    fn test_hourly_buckets_and_labels() {
        let trips = [
            trip_at(NOV_1_0800_CST + 5 * 60),
            trip_at(NOV_1_0800_CST + 59 * 60),
            trip_at(NOV_1_0800_CST + 61 * 60),
            trip_at(NOV_1_0800_CST + 90 * 60),
            trip_at(NOV_1_0800_CST + 120 * 60),
        ];
        let slices = time_slices(&trips, &config(1, TimeDelta::hours(1))).unwrap();
        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["2016-11-01 08:00", "2016-11-01 09:00", "2016-11-01 10:00"]);
        let sizes: Vec<usize> = slices.iter().map(|s| s.points.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(slices[0].start.timestamp(), NOV_1_0800_CST);
    }

    #[test]
    fn test_sparse_buckets_are_suppressed() {
        let trips = [
            trip_at(NOV_1_0800_CST),
            trip_at(NOV_1_0800_CST + 60),
            trip_at(NOV_1_0800_CST + 3600),
        ];
        let slices = time_slices(&trips, &config(2, TimeDelta::hours(1))).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "2016-11-01 08:00");
    }

    #[test]
    fn test_every_bucket_suppressed_gives_empty_result() {
        let trips = [trip_at(NOV_1_0800_CST)];
        assert!(time_slices(&trips, &EngineConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_daily_buckets_align_to_local_midnight() {
        // 08:00 CST is 00:00 UTC; a UTC-aligned bucket would start at 08:00 local.
        let trips = [trip_at(NOV_1_0800_CST), trip_at(NOV_1_0800_CST + 15 * 3600)];
        let slices = time_slices(&trips, &config(1, TimeDelta::days(1))).unwrap();
        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["2016-11-01 00:00"]);
        assert_eq!(slices[0].points.len(), 2);
    }

    #[test]
    fn test_other_timezone() {
        let config = EngineConfig::builder()
            .min_samples(1)
            .timezone(chrono_tz::UTC)
            .build();
        let slices = time_slices(&[trip_at(NOV_1_0800_CST + 30 * 60)], &config).unwrap();
        assert_eq!(slices[0].label, "2016-11-01 00:00");
    }

    #[test]
    fn test_bucket_starting_in_dst_gap_keeps_trips() {
        // Santiago skipped 2016-08-14 00:00-01:00 local; noon that day is 15:00 UTC.
        let noon = 1_471_186_800;
        let config = EngineConfig::builder()
            .min_samples(1)
            .granularity(TimeDelta::days(1))
            .timezone(chrono_tz::America::Santiago)
            .build();
        let slices = time_slices(&[trip_at(noon), trip_at(noon + 3600)], &config).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].points.len(), 2);
        assert_eq!(slices[0].label, "2016-08-14 01:00");
        // 01:00 -03 is the instant the clocks jumped.
        assert_eq!(slices[0].start.timestamp(), 1_471_147_200);
    }

    #[test]
    fn test_invalid_granularity() {
        let err = time_slices(&[], &config(1, TimeDelta::zero())).unwrap_err();
        assert!(matches!(err, OrderDataError::InvalidGranularity(0)));
    }

    #[test]
    fn test_empty_input() {
        assert!(time_slices(&[], &EngineConfig::default()).unwrap().is_empty());
    }
}
