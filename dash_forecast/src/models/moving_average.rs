//! Moving average model for time series forecasting

use crate::data::ObservationSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::{mean_absolute_error, root_mean_squared_error, AccuracyMetrics};
use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};
use series_math::{rolling_mean, rolling_std};
use tracing::debug;

/// Default trailing window
pub const DEFAULT_WINDOW: usize = 7;

/// Simple moving average model
///
/// Forecasts are flat at the last trailing mean, with a band of the last
/// trailing standard deviation around it.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    /// Name of the model
    name: String,
    /// Window size
    window: usize,
    z_score: f64,
}

/// Fitted moving average
#[derive(Debug, Clone)]
pub struct FittedMovingAverage {
    window: usize,
    /// Last trailing mean
    level: f64,
    /// Last trailing sample standard deviation
    spread: f64,
    z_score: f64,
    metrics: AccuracyMetrics,
}

impl MovingAverage {
    /// Create a new moving average model
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Window size must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("SMA({})", window),
            window,
            z_score: 1.96,
        })
    }

    /// Use a different band half-width, in standard deviations
    pub fn with_z_score(mut self, z_score: f64) -> Result<Self> {
        if !(z_score.is_finite() && z_score > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "z-score must be positive".to_string(),
            ));
        }
        self.z_score = z_score;
        Ok(self)
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self {
            name: format!("SMA({})", DEFAULT_WINDOW),
            window: DEFAULT_WINDOW,
            z_score: 1.96,
        }
    }
}

impl ForecastModel for MovingAverage {
    type Fitted = FittedMovingAverage;

    fn fit(&self, series: &ObservationSeries) -> Result<Self::Fitted> {
        series.require(self.window)?;
        let values = series.values();

        let means = rolling_mean(values, self.window)?;
        let spreads = rolling_std(values, self.window)?;

        // means[k] belongs to values[k + window - 1]
        let aligned = &values[self.window - 1..];
        let metrics = AccuracyMetrics::MovingAverage {
            rmse: root_mean_squared_error(aligned, &means)?,
            mae: mean_absolute_error(aligned, &means)?,
            window_size: self.window,
        };

        let level = means[means.len() - 1];
        let spread = spreads[spreads.len() - 1];
        debug!(window = self.window, level, spread, "Fitted moving average");

        Ok(FittedMovingAverage {
            window: self.window,
            level,
            spread,
            z_score: self.z_score,
            metrics,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedMovingAverage {
    /// Value every forecast step takes
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn spread(&self) -> f64 {
        self.spread
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl FittedModel for FittedMovingAverage {
    fn forecast(&self, horizon: usize) -> Result<ModelForecast> {
        ModelForecast::with_constant_band(vec![self.level; horizon], self.z_score * self.spread)
    }

    fn accuracy(&self) -> AccuracyMetrics {
        self.metrics.clone()
    }

    fn kind(&self) -> ModelKind {
        ModelKind::MovingAverage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn series(values: &[f64]) -> ObservationSeries {
        ObservationSeries::ordinal(values.to_vec()).unwrap()
    }

    #[test]
    fn test_flat_forecast_at_last_mean() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let fitted = MovingAverage::new(4).unwrap().fit(&series(&values)).unwrap();
        let forecast = fitted.forecast(6).unwrap();

        assert_eq!(forecast.values(), &[8.5; 6]);

        // sample std of 7, 8, 9, 10
        let spread = (5.0f64 / 3.0).sqrt();
        assert_relative_eq!(fitted.spread(), spread, epsilon = 1e-12);
        for (lo, hi) in forecast.lower().iter().zip(forecast.upper()) {
            assert_relative_eq!(*lo, 8.5 - 1.96 * spread, epsilon = 1e-12);
            assert_relative_eq!(*hi, 8.5 + 1.96 * spread, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_metrics_skip_warmup_points() {
        // rolling means of window 2: 1.5, 2.5, 3.5 against 2, 3, 4
        let fitted = MovingAverage::new(2)
            .unwrap()
            .fit(&series(&[1.0, 2.0, 3.0, 4.0]))
            .unwrap();

        assert_eq!(
            fitted.accuracy(),
            AccuracyMetrics::MovingAverage {
                rmse: 0.5,
                mae: 0.5,
                window_size: 2,
            }
        );
    }

    #[rstest]
    #[case(7, 6)]
    #[case(12, 11)]
    fn test_series_shorter_than_window(#[case] window: usize, #[case] len: usize) {
        let values = vec![1.0; len];
        let result = MovingAverage::new(window).unwrap().fit(&series(&values));

        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed, got }) if needed == window && got == len
        ));
    }

    #[test]
    fn test_zero_window_is_rejected() {
        assert!(matches!(
            MovingAverage::new(0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_window_of_one_has_no_band() {
        let fitted = MovingAverage::new(1)
            .unwrap()
            .fit(&series(&[3.0, 9.0, 4.0]))
            .unwrap();
        let forecast = fitted.forecast(2).unwrap();

        assert_eq!(forecast.values(), &[4.0, 4.0]);
        assert_eq!(forecast.lower(), forecast.upper());
    }
}
