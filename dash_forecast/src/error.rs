//! Error types for the dash_forecast crate

use series_math::MathError;
use thiserror::Error;

/// Custom error types for the dash_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The requested target field does not appear in any record
    #[error("Missing column: '{0}' not found in data")]
    MissingColumn(String),

    /// Fewer observations than the operation requires
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Numerical degeneracy in a model that has no further fallback
    #[error("Fit error: {0}")]
    FitError(String),

    /// The ARIMA estimator did not settle on usable parameters
    #[error("Convergence error: {0}")]
    Convergence(String),

    /// Model identifier not recognized (strict model selection only)
    #[error("Unknown model type: {0}")]
    UnknownModel(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A timestamp field could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Error related to loading or shaping input data
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::InvalidInput(msg) => ForecastError::InvalidParameter(msg),
            MathError::InsufficientData(msg) | MathError::CalculationError(msg) => {
                ForecastError::FitError(msg)
            }
        }
    }
}

impl ForecastError {
    /// Whether resubmitting the same request could succeed
    ///
    /// Only I/O failures are transient; every other variant is decided by the
    /// request and its data.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ForecastError::IoError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ForecastError::InsufficientData { needed: 10, got: 9 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 10 observations, got 9"
        );

        let err = ForecastError::MissingColumn("sales".to_string());
        assert_eq!(err.to_string(), "Missing column: 'sales' not found in data");
    }

    #[test]
    fn test_math_error_conversion() {
        let err: ForecastError = MathError::CalculationError("singular".to_string()).into();
        assert!(matches!(err, ForecastError::FitError(_)));

        let err: ForecastError = MathError::InvalidInput("window".to_string()).into();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }
}
