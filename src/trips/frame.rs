//! Polars glue around the pipeline: reading order tables, validating them into
//! [`RawOrderRecord`]s and turning enriched trips back into a `DataFrame`.

use crate::trips::engine::enrich_orders;
use crate::trips::error::OrderDataError;
use crate::types::config::EngineConfig;
use crate::types::order::{EnrichedTripRecord, RawOrderRecord};
use log::info;
use polars::prelude::*;
use std::path::Path;

// Input
pub const COL_START_TIME: &str = "start_time";
pub const COL_END_TIME: &str = "end_time";
pub const COL_START_LNG: &str = "start_long";
pub const COL_START_LAT: &str = "start_lat";
pub const COL_END_LNG: &str = "end_long";
pub const COL_END_LAT: &str = "end_lat";

// Derived
pub const COL_DURATION_MIN: &str = "duration_min";
pub const COL_DISTANCE_KM: &str = "distance_km";
pub const COL_SPEED_KMH: &str = "speed_kmh";
pub const COL_MID_LAT: &str = "mid_lat";
pub const COL_MID_LNG: &str = "mid_long";
pub const COL_CONGESTION_SCORE: &str = "congestion_score";
pub const COL_CONGESTION_WEIGHT: &str = "congestion_weight";

fn get_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, OrderDataError> {
    df.column(name)
        .map_err(|e| OrderDataError::MissingColumn(name.to_string(), e))
}

fn cast_column(df: &DataFrame, name: &str, dtype: &DataType) -> Result<Series, OrderDataError> {
    get_column(df, name)?
        .as_materialized_series()
        .strict_cast(dtype)
        .map_err(|e| OrderDataError::NonNumeric {
            column: name.to_string(),
            source: e,
        })
}

fn missing(name: &str, row: usize) -> OrderDataError {
    OrderDataError::MissingValue {
        column: name.to_string(),
        row,
    }
}

/// Reads a whole column as `i64`, rejecting nulls and values that cannot be cast.
///
/// Float columns are accepted only when every value is integral; casting would truncate.
fn int_values(df: &DataFrame, name: &str) -> Result<Vec<i64>, OrderDataError> {
    if get_column(df, name)?.dtype().is_float() {
        let floats = float_values(df, name)?;
        if let Some(row) = floats.iter().position(|v| v.fract() != 0.0) {
            return Err(OrderDataError::NonIntegral {
                column: name.to_string(),
                row,
            });
        }
    }
    let series = cast_column(df, name, &DataType::Int64)?;
    let values = series.i64().map_err(|e| OrderDataError::NonNumeric {
        column: name.to_string(),
        source: e,
    })?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| missing(name, row)))
        .collect()
}

/// Reads a whole column as `f64`, rejecting nulls and values that cannot be cast.
fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, OrderDataError> {
    let series = cast_column(df, name, &DataType::Float64)?;
    let values = series.f64().map_err(|e| OrderDataError::NonNumeric {
        column: name.to_string(),
        source: e,
    })?;
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| missing(name, row)))
        .collect()
}

/// A table of raw ride orders, typically straight from a CSV export.
///
/// Extra columns are allowed and ignored. The six columns named by the `COL_*` input constants
/// must be present, numeric and free of nulls.
#[derive(Debug, Clone)]
pub struct OrderFrame {
    pub frame: DataFrame,
}

impl OrderFrame {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Reads an order CSV with a header row.
    pub fn read_csv(path: &Path) -> Result<Self, OrderDataError> {
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| OrderDataError::CsvRead {
                path: path.to_path_buf(),
                source: e,
            })?
            .finish()
            .map_err(|e| OrderDataError::CsvRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        info!("Loaded {} orders from {}", frame.height(), path.display());
        Ok(Self::new(frame))
    }

    /// Validates the table and converts it into records.
    ///
    /// # Errors
    ///
    /// * [`OrderDataError::MissingColumn`] if a required column is absent.
    /// * [`OrderDataError::NonNumeric`] if a required column holds values that are not numbers.
    /// * [`OrderDataError::MissingValue`] for the first null found in a required column.
    pub fn records(&self) -> Result<Vec<RawOrderRecord>, OrderDataError> {
        let start_time = int_values(&self.frame, COL_START_TIME)?;
        let end_time = int_values(&self.frame, COL_END_TIME)?;
        let start_lng = float_values(&self.frame, COL_START_LNG)?;
        let start_lat = float_values(&self.frame, COL_START_LAT)?;
        let end_lng = float_values(&self.frame, COL_END_LNG)?;
        let end_lat = float_values(&self.frame, COL_END_LAT)?;

        Ok((0..self.frame.height())
            .map(|i| RawOrderRecord {
                start_time: start_time[i],
                end_time: end_time[i],
                start_lng: start_lng[i],
                start_lat: start_lat[i],
                end_lng: end_lng[i],
                end_lat: end_lat[i],
            })
            .collect())
    }

    /// Validates the table and runs the trip metrics pipeline over it.
    pub fn enrich(&self, config: &EngineConfig) -> Result<EnrichedFrame, OrderDataError> {
        let records = self.records()?;
        EnrichedFrame::from_trips(enrich_orders(&records, config))
    }
}

/// Enriched trips, both as records and as a `DataFrame` for export or further polars work.
#[derive(Debug, Clone)]
pub struct EnrichedFrame {
    pub trips: Vec<EnrichedTripRecord>,
    pub frame: DataFrame,
}

impl EnrichedFrame {
    pub fn from_trips(trips: Vec<EnrichedTripRecord>) -> Result<Self, OrderDataError> {
        let ints = |f: fn(&EnrichedTripRecord) -> i64| trips.iter().map(f).collect::<Vec<i64>>();
        let floats = |f: fn(&EnrichedTripRecord) -> f64| trips.iter().map(f).collect::<Vec<f64>>();

        let frame = df!(
            COL_START_TIME => ints(|t| t.start_time),
            COL_END_TIME => ints(|t| t.end_time),
            COL_START_LNG => floats(|t| t.start_lng_wgs84),
            COL_START_LAT => floats(|t| t.start_lat_wgs84),
            COL_END_LNG => floats(|t| t.end_lng_wgs84),
            COL_END_LAT => floats(|t| t.end_lat_wgs84),
            COL_DURATION_MIN => floats(|t| t.duration_min),
            COL_DISTANCE_KM => floats(|t| t.distance_km),
            COL_SPEED_KMH => floats(|t| t.speed_kmh),
            COL_MID_LAT => floats(|t| t.mid_lat),
            COL_MID_LNG => floats(|t| t.mid_lng),
            COL_CONGESTION_SCORE => floats(|t| t.congestion_score),
            COL_CONGESTION_WEIGHT => floats(|t| t.congestion_weight)
        )?;

        Ok(Self { trips, frame })
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn write_csv(&mut self, path: &Path) -> Result<(), OrderDataError> {
        let mut file = std::fs::File::create(path)
            .map_err(|e| OrderDataError::WriteIo(path.to_path_buf(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut self.frame)
            .map_err(|e| OrderDataError::WritePolars(path.to_path_buf(), e))?;
        info!("Wrote {} trips to {}", self.frame.height(), path.display());
        Ok(())
    }

    pub fn write_parquet(&mut self, path: &Path) -> Result<(), OrderDataError> {
        let file = std::fs::File::create(path)
            .map_err(|e| OrderDataError::WriteIo(path.to_path_buf(), e))?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut self.frame)
            .map_err(|e| OrderDataError::WritePolars(path.to_path_buf(), e))?;
        info!("Wrote {} trips to {}", self.frame.height(), path.display());
        Ok(())
    }
}
