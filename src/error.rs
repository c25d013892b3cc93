use crate::climate::error::ClimateDataError;
use crate::trips::error::OrderDataError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrbanMetricsError {
    #[error(transparent)]
    Orders(#[from] OrderDataError),

    #[error(transparent)]
    Climate(#[from] ClimateDataError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_errors_convert_transparently() {
        let err: UrbanMetricsError = OrderDataError::InvalidGranularity(0).into();
        assert!(matches!(err, UrbanMetricsError::Orders(_)));
        assert_eq!(
            err.to_string(),
            OrderDataError::InvalidGranularity(0).to_string()
        );

        let err: UrbanMetricsError =
            ClimateDataError::FileNotFound("GlobalTemperatures.csv".into()).into();
        assert!(err.to_string().contains("GlobalTemperatures.csv"));
    }
}
