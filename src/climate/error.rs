use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimateDataError {
    #[error("Climate dataset '{0}' not found")]
    FileNotFound(PathBuf),

    #[error("Failed to read metadata for '{0}'")]
    MetadataRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to read climate CSV '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Required column '{0}' not found in climate table")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
