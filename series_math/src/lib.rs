//! # Series Math
//!
//! Numerical building blocks for the forecasting models: rolling-window
//! statistics, least-squares trend fitting and a bounded simplex optimizer.

use thiserror::Error;

pub mod moving_averages;
pub mod optimization;
pub mod regression;

pub use moving_averages::{rolling_mean, rolling_std};
pub use optimization::{nelder_mead, Minimum, NelderMeadConfig};
pub use regression::LinearRegression;

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
