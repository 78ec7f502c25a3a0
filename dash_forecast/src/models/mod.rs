//! Forecasting models for observation series

use crate::data::ObservationSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::AccuracyMetrics;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

pub mod arima;
pub mod linear_regression;
pub mod moving_average;

pub use arima::Arima;
pub use linear_regression::LinearTrend;
pub use moving_average::MovingAverage;

/// The fitting strategies a request can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Arima,
    LinearRegression,
    MovingAverage,
}

impl ModelKind {
    /// Model used when a request names none, or names one we don't know
    pub const DEFAULT: ModelKind = ModelKind::Arima;

    /// Wire identifier of the model
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Arima => "arima",
            ModelKind::LinearRegression => "linear_regression",
            ModelKind::MovingAverage => "moving_average",
        }
    }

    /// Map a requested identifier to a model, defaulting to ARIMA
    ///
    /// The flag is `false` when the identifier was not recognized.
    pub fn resolve(requested: &str) -> (ModelKind, bool) {
        match requested.parse() {
            Ok(kind) => (kind, true),
            Err(_) => (Self::DEFAULT, false),
        }
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "arima" => Ok(ModelKind::Arima),
            "linear_regression" => Ok(ModelKind::LinearRegression),
            "moving_average" => Ok(ModelKind::MovingAverage),
            _ => Err(ForecastError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point forecasts with their confidence band
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    values: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ModelForecast {
    /// Create a forecast from values and band bounds of equal length
    pub fn new_with_intervals(values: Vec<f64>, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if values.len() != lower.len() || values.len() != upper.len() {
            return Err(ForecastError::DataError(format!(
                "Values length ({}) doesn't match interval lengths ({}, {})",
                values.len(),
                lower.len(),
                upper.len()
            )));
        }

        if values
            .iter()
            .chain(&lower)
            .chain(&upper)
            .any(|v| !v.is_finite())
        {
            return Err(ForecastError::FitError(
                "Forecast contains non-finite values".to_string(),
            ));
        }

        Ok(Self { values, lower, upper })
    }

    /// Band of constant half-width around each value
    pub fn with_constant_band(values: Vec<f64>, half_width: f64) -> Result<Self> {
        let lower = values.iter().map(|v| v - half_width).collect();
        let upper = values.iter().map(|v| v + half_width).collect();
        Self::new_with_intervals(values, lower, upper)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Lower band bounds
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper band bounds
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        (self.values, self.lower, self.upper)
    }
}

/// Model fitted to one series
pub trait FittedModel: Debug {
    /// Forecast `horizon` periods past the end of the series
    fn forecast(&self, horizon: usize) -> Result<ModelForecast>;

    /// In-sample fit diagnostics
    fn accuracy(&self) -> AccuracyMetrics;

    /// Which strategy produced this fit
    fn kind(&self) -> ModelKind;
}

/// Forecast model that can be fitted to a series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedModel;

    /// Fit the model on the series
    fn fit(&self, series: &ObservationSeries) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
