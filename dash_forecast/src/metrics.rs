//! Goodness-of-fit metrics reported with every forecast

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn check_lengths(actual: &[f64], fitted: &[f64]) -> Result<()> {
    if actual.len() != fitted.len() || actual.is_empty() {
        return Err(ForecastError::DataError(format!(
            "Actual ({}) and fitted ({}) values must have the same non-zero length",
            actual.len(),
            fitted.len()
        )));
    }
    Ok(())
}

/// Mean absolute error
pub fn mean_absolute_error(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    check_lengths(actual, fitted)?;
    let sum: f64 = actual.iter().zip(fitted).map(|(a, f)| (a - f).abs()).sum();
    Ok(sum / actual.len() as f64)
}

/// Mean squared error
pub fn mean_squared_error(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    check_lengths(actual, fitted)?;
    let sum: f64 = actual.iter().zip(fitted).map(|(a, f)| (a - f).powi(2)).sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error
pub fn root_mean_squared_error(actual: &[f64], fitted: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(actual, fitted)?.sqrt())
}

/// Per-model accuracy figures
///
/// Each model reports its own metric set; serialized untagged so the JSON
/// shape is just the metric names, e.g. `{"rmse": .., "mae": .., "aic": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccuracyMetrics {
    Arima { rmse: f64, mae: f64, aic: f64 },
    LinearRegression { rmse: f64, mae: f64, r2_score: f64 },
    MovingAverage { rmse: f64, mae: f64, window_size: usize },
}

impl AccuracyMetrics {
    /// Root mean squared error of the in-sample fit
    pub fn rmse(&self) -> f64 {
        match self {
            AccuracyMetrics::Arima { rmse, .. }
            | AccuracyMetrics::LinearRegression { rmse, .. }
            | AccuracyMetrics::MovingAverage { rmse, .. } => *rmse,
        }
    }

    /// Mean absolute error of the in-sample fit
    pub fn mae(&self) -> f64 {
        match self {
            AccuracyMetrics::Arima { mae, .. }
            | AccuracyMetrics::LinearRegression { mae, .. }
            | AccuracyMetrics::MovingAverage { mae, .. } => *mae,
        }
    }

    /// Flatten into a metric name to value map, for storage
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("rmse".to_string(), self.rmse());
        map.insert("mae".to_string(), self.mae());
        match self {
            AccuracyMetrics::Arima { aic, .. } => {
                map.insert("aic".to_string(), *aic);
            }
            AccuracyMetrics::LinearRegression { r2_score, .. } => {
                map.insert("r2_score".to_string(), *r2_score);
            }
            AccuracyMetrics::MovingAverage { window_size, .. } => {
                map.insert("window_size".to_string(), *window_size as f64);
            }
        }
        map
    }
}

impl std::fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse())?;
        writeln!(f, "  MAE:   {:.4}", self.mae())?;
        match self {
            AccuracyMetrics::Arima { aic, .. } => writeln!(f, "  AIC:   {:.4}", aic)?,
            AccuracyMetrics::LinearRegression { r2_score, .. } => {
                writeln!(f, "  R2:    {:.4}", r2_score)?
            }
            AccuracyMetrics::MovingAverage { window_size, .. } => {
                writeln!(f, "  Window: {}", window_size)?
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_metrics() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let fitted = [12.0, 18.0, 33.0, 37.0, 52.0];

        assert!((mean_absolute_error(&actual, &fitted).unwrap() - 2.4).abs() < 1e-12);
        assert!((mean_squared_error(&actual, &fitted).unwrap() - 6.0).abs() < 1e-12);
        assert!((root_mean_squared_error(&actual, &fitted).unwrap() - 6.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(mean_absolute_error(&[1.0, 2.0], &[1.0]).is_err());
        assert!(mean_squared_error(&[], &[]).is_err());
    }

    #[test]
    fn test_metric_keys_per_model() {
        let arima = AccuracyMetrics::Arima { rmse: 1.0, mae: 0.5, aic: 42.0 };
        let keys: Vec<String> = arima.to_map().into_keys().collect();
        assert_eq!(keys, vec!["aic", "mae", "rmse"]);

        let ma = AccuracyMetrics::MovingAverage { rmse: 1.0, mae: 0.5, window_size: 7 };
        assert_eq!(ma.to_map()["window_size"], 7.0);

        let json = serde_json::to_value(&AccuracyMetrics::LinearRegression {
            rmse: 0.0,
            mae: 0.0,
            r2_score: 1.0,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"rmse": 0.0, "mae": 0.0, "r2_score": 1.0}));
    }
}
