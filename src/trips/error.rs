use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderDataError {
    #[error("Required column '{0}' not found in order table")]
    MissingColumn(String, #[source] PolarsError),

    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Column '{column}' is not numeric")]
    NonNumeric {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Column '{column}' has a non-integral value at row {row}")]
    NonIntegral { column: String, row: usize },

    #[error("Failed to read order CSV '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("I/O error writing '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing '{0}'")]
    WritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to serialize heat map layer")]
    Json(#[from] serde_json::Error),

    #[error("Time bucket granularity must be a positive number of seconds, got {0}s")]
    InvalidGranularity(i64),

    #[error("Failed building enriched DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
