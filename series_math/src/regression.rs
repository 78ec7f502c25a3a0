//! Ordinary least squares trend fitting
//!
//! The regressor is the zero-based position of each observation, so a fitted
//! line can be extended simply by continuing the integer sequence.

use crate::{MathError, Result};

/// Linear trend `y = intercept + slope * i` fitted by least squares
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
    observations: usize,
}

impl LinearRegression {
    /// Fit the trend line over `values`, using positions `0..values.len()` as x
    pub fn fit(values: &[f64]) -> Result<Self> {
        let n = values.len();
        if n < 2 {
            return Err(MathError::InsufficientData(
                "Not enough data for linear regression. Need at least 2 points.".to_string(),
            ));
        }

        let n_f = n as f64;
        let x_mean = (n_f - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n_f;

        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            numerator += dx * (y - y_mean);
            denominator += dx * dx;
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(MathError::CalculationError(
                "Regression coefficients are not finite".to_string(),
            ));
        }

        Ok(Self {
            slope,
            intercept,
            observations: n,
        })
    }

    /// Value of the trend line at position `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// In-sample values at positions `0..n`
    pub fn fitted_values(&self) -> Vec<f64> {
        (0..self.observations)
            .map(|i| self.predict(i as f64))
            .collect()
    }

    /// Out-of-sample values at positions `n..n + periods`
    pub fn forecast(&self, periods: usize) -> Vec<f64> {
        (self.observations..self.observations + periods)
            .map(|i| self.predict(i as f64))
            .collect()
    }

    /// Coefficient of determination against the values the line was fitted on
    pub fn r_squared(&self, values: &[f64]) -> Result<f64> {
        if values.len() != self.observations {
            return Err(MathError::InvalidInput(format!(
                "Expected {} values, got {}",
                self.observations,
                values.len()
            )));
        }

        let y_mean = values.iter().sum::<f64>() / values.len() as f64;

        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;

        for (i, &y) in values.iter().enumerate() {
            ss_total += (y - y_mean).powi(2);
            ss_residual += (y - self.predict(i as f64)).powi(2);
        }

        if ss_total.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate R-squared: total sum of squares is too small".to_string(),
            ));
        }

        Ok(1.0 - (ss_residual / ss_total))
    }

    /// Get the slope (trend per period)
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Get the intercept (trend value at position 0)
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of observations used in the fit
    pub fn observations(&self) -> usize {
        self.observations
    }
}
