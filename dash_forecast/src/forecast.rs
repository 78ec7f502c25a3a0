//! Forecast pipeline: prepare the series, route to a model, assemble the result

use crate::config::ForecastConfig;
use crate::data::{prepare_series, ObservationSeries, Record};
use crate::error::{ForecastError, Result};
use crate::metrics::AccuracyMetrics;
use crate::models::{
    Arima, FittedModel, ForecastModel, LinearTrend, ModelKind, MovingAverage,
};
use crate::utils::{date_labels, future_dates};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// What the caller asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Record field holding the values to forecast
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Requested model identifier, as sent by the caller
    #[serde(default = "default_model_type")]
    pub model_type: String,

    /// Number of future periods
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Moving-average window; the configured default applies when unset
    #[serde(default)]
    pub window: Option<usize>,

    /// Anchor for the dates of a series without timestamps
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

fn default_target_column() -> String {
    "value".to_string()
}
fn default_model_type() -> String {
    ModelKind::DEFAULT.as_str().to_string()
}
fn default_horizon() -> usize {
    30
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            target_column: default_target_column(),
            model_type: default_model_type(),
            horizon: default_horizon(),
            window: None,
            reference_date: None,
        }
    }
}

impl ForecastRequest {
    /// Create a request for `horizon` periods of `target_column`
    pub fn new(target_column: impl Into<String>, model_type: impl Into<String>, horizon: usize) -> Self {
        Self {
            target_column: target_column.into(),
            model_type: model_type.into(),
            horizon,
            ..Self::default()
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }
}

/// Band around the point forecasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Which model produced the numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    /// The routed model fitted successfully
    Fitted { model: ModelKind },
    /// The routed model failed and another one delivered the forecast
    Substituted {
        requested: ModelKind,
        used: ModelKind,
        reason: String,
    },
}

impl ModelOutcome {
    /// Model whose forecast is reported
    pub fn used(&self) -> ModelKind {
        match self {
            ModelOutcome::Fitted { model } => *model,
            ModelOutcome::Substituted { used, .. } => *used,
        }
    }
}

/// A complete forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub model: ModelOutcome,
    /// Model identifier exactly as requested
    pub requested_model: String,
    pub target_column: String,
    pub predictions: Vec<f64>,
    pub confidence_interval: ConfidenceInterval,
    pub accuracy_metrics: AccuracyMetrics,
    pub forecast_dates: Vec<NaiveDate>,
}

impl ForecastResult {
    /// Model whose forecast is reported
    pub fn model_type_used(&self) -> ModelKind {
        self.model.used()
    }

    /// True when a fallback model replaced the routed one
    pub fn is_substituted(&self) -> bool {
        matches!(self.model, ModelOutcome::Substituted { .. })
    }

    pub fn horizon(&self) -> usize {
        self.predictions.len()
    }

    /// Forecast dates as `YYYY-MM-DD`
    pub fn date_labels(&self) -> Vec<String> {
        date_labels(&self.forecast_dates)
    }

    /// Metric name to value
    pub fn metrics_map(&self) -> BTreeMap<String, f64> {
        self.accuracy_metrics.to_map()
    }
}

/// Runs forecast requests under one configuration
///
/// Holds no mutable state; one instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Map a requested identifier to a model
    ///
    /// Unknown identifiers become ARIMA unless strict selection is on.
    pub fn route(&self, model_type: &str) -> Result<ModelKind> {
        let (kind, recognized) = ModelKind::resolve(model_type);
        if !recognized {
            if self.config.strict_model_selection {
                return Err(ForecastError::UnknownModel(model_type.to_string()));
            }
            warn!(requested = model_type, fallback = %kind, "Unknown model type");
        }
        Ok(kind)
    }

    /// Fit the requested model to `records` and forecast `request.horizon` periods
    pub fn forecast(&self, records: &[Record], request: &ForecastRequest) -> Result<ForecastResult> {
        let start = Instant::now();

        if request.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Horizon must be at least 1".to_string(),
            ));
        }
        let kind = self.route(&request.model_type)?;

        info!(
            records = records.len(),
            column = %request.target_column,
            model = %kind,
            horizon = request.horizon,
            "Starting forecast"
        );

        let series = prepare_series(records, &request.target_column, self.config.min_observations)?;
        let (fitted, outcome) = self.fit(kind, &series, request)?;

        let (predictions, lower, upper) = fitted.forecast(request.horizon)?.into_parts();
        let forecast_dates = self.forecast_dates(&series, request)?;

        info!(
            model = %outcome.used(),
            substituted = matches!(outcome, ModelOutcome::Substituted { .. }),
            observations = series.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Forecast complete"
        );

        Ok(ForecastResult {
            model: outcome,
            requested_model: request.model_type.clone(),
            target_column: request.target_column.clone(),
            predictions,
            confidence_interval: ConfidenceInterval { lower, upper },
            accuracy_metrics: fitted.accuracy(),
            forecast_dates,
        })
    }

    fn fit(
        &self,
        kind: ModelKind,
        series: &ObservationSeries,
        request: &ForecastRequest,
    ) -> Result<(Box<dyn FittedModel>, ModelOutcome)> {
        let z_score = self.config.z_score;

        let fitted: Box<dyn FittedModel> = match kind {
            ModelKind::Arima => {
                let arima = Arima::new(z_score, self.config.arima.clone())?;
                match arima.fit(series) {
                    Ok(fitted) => Box::new(fitted),
                    Err(e) => {
                        warn!(error = %e, "ARIMA fit failed, falling back to linear regression");
                        let fallback = LinearTrend::new(z_score)?.fit(series)?;
                        let outcome = ModelOutcome::Substituted {
                            requested: ModelKind::Arima,
                            used: ModelKind::LinearRegression,
                            reason: e.to_string(),
                        };
                        return Ok((Box::new(fallback), outcome));
                    }
                }
            }
            ModelKind::LinearRegression => Box::new(LinearTrend::new(z_score)?.fit(series)?),
            ModelKind::MovingAverage => {
                let window = request.window.unwrap_or(self.config.default_window);
                let model = MovingAverage::new(window)?.with_z_score(z_score)?;
                Box::new(model.fit(series)?)
            }
        };

        Ok((fitted, ModelOutcome::Fitted { model: kind }))
    }

    fn forecast_dates(&self, series: &ObservationSeries, request: &ForecastRequest) -> Result<Vec<NaiveDate>> {
        let anchor = series
            .last_date()
            .or(request.reference_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        future_dates(anchor, request.horizon, self.config.frequency)
    }
}

/// Forecast with the default configuration
///
/// # Example
///
/// ```
/// use dash_forecast::{generate_forecast, ModelKind};
/// use serde_json::json;
///
/// let records: Vec<_> = (0..15)
///     .map(|i| {
///         json!({
///             "timestamp": format!("2024-01-{:02}", i + 1),
///             "value": 100.0 + 5.0 * i as f64,
///         })
///         .as_object()
///         .cloned()
///         .unwrap()
///     })
///     .collect();
///
/// let result = generate_forecast(&records, "value", "linear_regression", 5).unwrap();
/// assert_eq!(result.model_type_used(), ModelKind::LinearRegression);
/// assert_eq!(result.date_labels()[0], "2024-01-16");
/// ```
pub fn generate_forecast(
    records: &[Record],
    target_column: &str,
    model_type: &str,
    horizon: usize,
) -> Result<ForecastResult> {
    let request = ForecastRequest::new(target_column, model_type, horizon);
    Forecaster::default().forecast(records, &request)
}
