//! Hexagonal binning of trip midpoints for static congestion heat maps.
//!
//! The grid is the usual "two offset rectangular lattices" hexbin: lattice A has centers on
//! integer grid positions, lattice B on the half-offset positions, and each point goes to
//! the nearer of its two candidate centers under the `dx² + 3·dy²` metric (grid units).
//! Cells report the mean congestion score of their trips.

use crate::types::config::HexbinConfig;
use crate::types::lat_lon::LatLon;
use crate::types::order::EnrichedTripRecord;
use log::{debug, warn};
use std::collections::BTreeMap;

/// One populated hexagon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexCell {
    pub center: LatLon,
    pub count: usize,
    pub mean_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Lattice {
    Integer,
    Offset,
}

/// Widens a zero-width range so the grid has a usable cell size.
fn nonsingular(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        return (min, max);
    }
    if min == 0.0 {
        (-0.1, 0.1)
    } else {
        (min - 0.1 * min.abs(), max + 0.1 * max.abs())
    }
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Bins trip midpoints (`mid_lng` on x, `mid_lat` on y) into hexagons.
///
/// The grid spans the data extent with `config.gridsize` hexagons across and
/// `gridsize / √3` down. Cells with fewer than `config.min_count` trips are dropped.
/// Cells of the integer lattice come first, each lattice ordered by column then row.
pub fn hexbin(trips: &[EnrichedTripRecord], config: &HexbinConfig) -> Vec<HexCell> {
    if trips.is_empty() {
        warn!("Hexbin requested for an empty trip batch");
        return Vec::new();
    }

    let nx = config.gridsize.max(1);
    let ny = ((nx as f64 / 3f64.sqrt()) as usize).max(1);

    let (xmin, xmax) = extent(trips.iter().map(|t| t.mid_lng));
    let (ymin, ymax) = extent(trips.iter().map(|t| t.mid_lat));
    let (xmin, xmax) = nonsingular(xmin, xmax);
    let (ymin, ymax) = nonsingular(ymin, ymax);
    let padding = 1e-9 * (xmax - xmin);
    let (xmin, xmax) = (xmin - padding, xmax + padding);

    let sx = (xmax - xmin) / nx as f64;
    let sy = (ymax - ymin) / ny as f64;

    // (count, score sum) per cell.
    let mut cells: BTreeMap<(Lattice, usize, usize), (usize, f64)> = BTreeMap::new();
    for trip in trips {
        let ix = (trip.mid_lng - xmin) / sx;
        let iy = (trip.mid_lat - ymin) / sy;

        let (ix1, iy1) = (ix.round_ties_even(), iy.round_ties_even());
        let (ix2, iy2) = (ix.floor(), iy.floor());
        let d1 = (ix - ix1).powi(2) + 3.0 * (iy - iy1).powi(2);
        let d2 = (ix - ix2 - 0.5).powi(2) + 3.0 * (iy - iy2 - 0.5).powi(2);

        let key = if d1 < d2 {
            (
                Lattice::Integer,
                (ix1.max(0.0) as usize).min(nx),
                (iy1.max(0.0) as usize).min(ny),
            )
        } else {
            (
                Lattice::Offset,
                (ix2.max(0.0) as usize).min(nx - 1),
                (iy2.max(0.0) as usize).min(ny - 1),
            )
        };
        let cell = cells.entry(key).or_insert((0, 0.0));
        cell.0 += 1;
        cell.1 += trip.congestion_score;
    }

    let total_cells = cells.len();
    let result: Vec<HexCell> = cells
        .into_iter()
        .filter(|(_, (count, _))| *count >= config.min_count)
        .map(|((lattice, i, j), (count, sum))| {
            let offset = match lattice {
                Lattice::Integer => 0.0,
                Lattice::Offset => 0.5,
            };
            HexCell {
                center: LatLon(
                    ymin + (j as f64 + offset) * sy,
                    xmin + (i as f64 + offset) * sx,
                ),
                count,
                mean_score: sum / count as f64,
            }
        })
        .collect();

    debug!(
        "Hexbin kept {} of {} populated cells (min count {})",
        result.len(),
        total_cells,
        config.min_count
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(mid_lat: f64, mid_lng: f64, score: f64) -> EnrichedTripRecord {
        EnrichedTripRecord {
            start_time: 0,
            end_time: 600,
            start_lng_wgs84: mid_lng,
            start_lat_wgs84: mid_lat,
            end_lng_wgs84: mid_lng,
            end_lat_wgs84: mid_lat,
            duration_min: 10.0,
            distance_km: 1.0,
            speed_kmh: 40.0 - score,
            mid_lat,
            mid_lng,
            congestion_score: score,
            congestion_weight: 0.0,
        }
    }

    #[test]
    fn test_empty_batch() {
        assert!(hexbin(&[], &HexbinConfig::default()).is_empty());
    }

    #[test]
    fn test_single_location_forms_one_cell() {
        let trips: Vec<_> = [10.0, 20.0, 30.0, 20.0, 20.0]
            .iter()
            .map(|&s| trip(30.66, 104.07, s))
            .collect();
        let cells = hexbin(&trips, &HexbinConfig::default());
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].count, 5);
        assert!((cells[0].mean_score - 20.0).abs() < 1e-12);
        // The cell center is within one cell of the points.
        assert!((cells[0].center.0 - 30.66).abs() < 0.5);
        assert!((cells[0].center.1 - 104.07).abs() < 0.5);
    }

    #[test]
    fn test_sparse_cells_are_dropped() {
        let mut trips = Vec::new();
        for _ in 0..4 {
            trips.push(trip(30.60, 104.00, 30.0));
        }
        for _ in 0..2 {
            trips.push(trip(30.80, 104.20, 5.0));
        }
        let config = HexbinConfig::builder().min_count(3).build();
        let cells = hexbin(&trips, &config);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].count, 4);
        assert_eq!(cells[0].mean_score, 30.0);
        assert!((cells[0].center.0 - 30.60).abs() < 0.01);
        assert!((cells[0].center.1 - 104.00).abs() < 0.01);
    }

    #[test]
    fn test_every_point_lands_in_a_cell() {
        let trips: Vec<_> = (0..200)
            .map(|i| {
                let f = i as f64;
                trip(30.5 + (f * 0.37).sin() * 0.2, 104.0 + (f * 0.11).cos() * 0.2, f % 40.0)
            })
            .collect();
        let config = HexbinConfig::builder().gridsize(10).min_count(0).build();
        let cells = hexbin(&trips, &config);
        let total: usize = cells.iter().map(|c| c.count).sum();
        assert_eq!(total, trips.len());
        for cell in &cells {
            assert!((0.0..40.0).contains(&cell.mean_score));
        }
    }
}
