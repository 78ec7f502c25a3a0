//! Linear trend model
//!
//! Least squares on (position, value). Positions are the zero-based index in
//! the sorted series, not calendar time, so irregular spacing is ignored.

use crate::data::ObservationSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::{mean_absolute_error, root_mean_squared_error, AccuracyMetrics};
use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};
use series_math::LinearRegression;
use statrs::statistics::Statistics;
use tracing::debug;

/// Linear trend model
#[derive(Debug, Clone)]
pub struct LinearTrend {
    /// Name of the model
    name: String,
    /// Band half-width in residual standard deviations
    z_score: f64,
}

/// Fitted linear trend
#[derive(Debug, Clone)]
pub struct FittedLinearTrend {
    regression: LinearRegression,
    /// Population standard deviation of the training residuals
    residual_std: f64,
    z_score: f64,
    metrics: AccuracyMetrics,
}

impl LinearTrend {
    /// Create a new linear trend model
    pub fn new(z_score: f64) -> Result<Self> {
        if !(z_score.is_finite() && z_score > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "z-score must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: "Linear Regression".to_string(),
            z_score,
        })
    }
}

impl Default for LinearTrend {
    fn default() -> Self {
        Self {
            name: "Linear Regression".to_string(),
            z_score: 1.96,
        }
    }
}

impl ForecastModel for LinearTrend {
    type Fitted = FittedLinearTrend;

    fn fit(&self, series: &ObservationSeries) -> Result<Self::Fitted> {
        series.require(2)?;
        let values = series.values();

        let regression = LinearRegression::fit(values)?;
        let r2_score = regression.r_squared(values).map_err(|_| {
            ForecastError::FitError(
                "Series has zero variance; the regression fit is degenerate".to_string(),
            )
        })?;

        let fitted = regression.fitted_values();
        let residuals: Vec<f64> = values.iter().zip(&fitted).map(|(y, f)| y - f).collect();
        let residual_std = residuals.iter().population_std_dev();

        let metrics = AccuracyMetrics::LinearRegression {
            rmse: root_mean_squared_error(values, &fitted)?,
            mae: mean_absolute_error(values, &fitted)?,
            r2_score,
        };

        debug!(
            slope = regression.slope(),
            intercept = regression.intercept(),
            residual_std,
            "Fitted linear trend"
        );

        Ok(FittedLinearTrend {
            regression,
            residual_std,
            z_score: self.z_score,
            metrics,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedLinearTrend {
    /// Trend per period
    pub fn slope(&self) -> f64 {
        self.regression.slope()
    }

    /// Trend value at the first observation
    pub fn intercept(&self) -> f64 {
        self.regression.intercept()
    }

    /// Residual standard deviation used for the band
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }
}

impl FittedModel for FittedLinearTrend {
    fn forecast(&self, horizon: usize) -> Result<ModelForecast> {
        let values = self.regression.forecast(horizon);
        ModelForecast::with_constant_band(values, self.z_score * self.residual_std)
    }

    fn accuracy(&self) -> AccuracyMetrics {
        self.metrics.clone()
    }

    fn kind(&self) -> ModelKind {
        ModelKind::LinearRegression
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_trend() {
        let values: Vec<f64> = (0..15).map(|i| 100.0 + 5.0 * i as f64).collect();
        let series = ObservationSeries::ordinal(values).unwrap();

        let fitted = LinearTrend::default().fit(&series).unwrap();
        let forecast = fitted.forecast(5).unwrap();

        for (got, want) in forecast.values().iter().zip([175.0, 180.0, 185.0, 190.0, 195.0]) {
            assert!((got - want).abs() < 1e-9);
        }
        assert!(fitted.residual_std() < 1e-9);

        match fitted.accuracy() {
            AccuracyMetrics::LinearRegression { r2_score, rmse, .. } => {
                assert!((r2_score - 1.0).abs() < 1e-12);
                assert!(rmse < 1e-9);
            }
            other => panic!("unexpected metrics {:?}", other),
        }
    }

    #[test]
    fn test_band_width_is_constant() {
        let values = vec![3.0, 5.0, 4.0, 8.0, 6.0, 9.0, 7.0, 11.0, 10.0, 12.0];
        let series = ObservationSeries::ordinal(values).unwrap();

        let fitted = LinearTrend::new(1.96).unwrap().fit(&series).unwrap();
        let forecast = fitted.forecast(8).unwrap();

        let width = forecast.upper()[0] - forecast.lower()[0];
        assert!(width > 0.0);
        for (lo, hi) in forecast.lower().iter().zip(forecast.upper()) {
            assert!(((hi - lo) - width).abs() < 1e-9);
        }
        assert!((width - 2.0 * 1.96 * fitted.residual_std()).abs() < 1e-9);
    }

    #[test]
    fn test_flat_series_is_degenerate() {
        let series = ObservationSeries::ordinal(vec![4.0; 12]).unwrap();
        assert!(matches!(
            LinearTrend::default().fit(&series),
            Err(ForecastError::FitError(_))
        ));
    }

    #[test]
    fn test_invalid_z_score() {
        assert!(LinearTrend::new(0.0).is_err());
        assert!(LinearTrend::new(f64::NAN).is_err());
    }
}
