//! ARIMA(1,1,1) model for time series forecasting
//!
//! The series is differenced once and an ARMA(1,1) without constant is fitted
//! to the differences by conditional sum of squares:
//!
//! ```text
//! d[t] = phi * d[t-1] + theta * e[t-1] + e[t]
//! ```
//!
//! The recursion starts at `t = 1` with `e[0] = 0`. Forecasts are integrated
//! back onto the level of the last observation, and the band widens with the
//! horizon following the psi weights of the integrated process.

use crate::config::ArimaConfig;
use crate::data::ObservationSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::{mean_absolute_error, root_mean_squared_error, AccuracyMetrics};
use crate::models::{FittedModel, ForecastModel, ModelForecast, ModelKind};
use series_math::{nelder_mead, NelderMeadConfig};
use std::f64::consts::PI;
use tracing::debug;

/// Coefficients are kept inside the stationary and invertible region
const COEFFICIENT_BOUNDS: [(f64, f64); 2] = [(-0.99, 0.99), (-0.99, 0.99)];

const INITIAL_PARAMS: [f64; 2] = [0.1, 0.1];

/// phi, theta and the innovation variance
const ESTIMATED_PARAMS: usize = 3;

/// Smallest relative CSS change that still counts as curvature
const FLAT_SURFACE_TOLERANCE: f64 = 1e-12;

const PROBE_STEP: f64 = 1e-3;

/// ARIMA(1,1,1) model
#[derive(Debug, Clone)]
pub struct Arima {
    /// Name of the model
    name: String,
    /// Band half-width in standard errors
    z_score: f64,
    solver: ArimaConfig,
}

/// Fitted ARIMA(1,1,1)
#[derive(Debug, Clone)]
pub struct FittedArima {
    phi: f64,
    theta: f64,
    sigma2: f64,
    aic: f64,
    /// One-step-ahead fitted levels for observations 1..n
    fitted: Vec<f64>,
    last_value: f64,
    last_diff: f64,
    last_residual: f64,
    z_score: f64,
    metrics: AccuracyMetrics,
}

impl Arima {
    /// Create a new ARIMA model
    pub fn new(z_score: f64, solver: ArimaConfig) -> Result<Self> {
        if !(z_score.is_finite() && z_score > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "z-score must be positive".to_string(),
            ));
        }
        if solver.max_iterations == 0 || !(solver.tolerance > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "ARIMA solver needs a positive iteration limit and tolerance".to_string(),
            ));
        }

        Ok(Self {
            name: "ARIMA(1,1,1)".to_string(),
            z_score,
            solver,
        })
    }

    fn solver_config(&self) -> NelderMeadConfig {
        NelderMeadConfig {
            max_iterations: self.solver.max_iterations,
            tolerance: self.solver.tolerance,
            ..NelderMeadConfig::default()
        }
    }
}

impl Default for Arima {
    fn default() -> Self {
        Self {
            name: "ARIMA(1,1,1)".to_string(),
            z_score: 1.96,
            solver: ArimaConfig::default(),
        }
    }
}

/// First differences of `values`
fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// One-step predictions and residuals of the ARMA(1,1) recursion
///
/// `predictions[t]` is the forecast of `diffs[t]` made at `t - 1`; the first
/// one is zero since nothing precedes it.
fn arma_recursion(diffs: &[f64], phi: f64, theta: f64) -> (Vec<f64>, Vec<f64>) {
    let mut predictions = Vec::with_capacity(diffs.len());
    let mut residuals = Vec::with_capacity(diffs.len());

    for (t, &d) in diffs.iter().enumerate() {
        let prediction = if t == 0 {
            0.0
        } else {
            phi * diffs[t - 1] + theta * residuals[t - 1]
        };
        predictions.push(prediction);
        residuals.push(if t == 0 { 0.0 } else { d - prediction });
    }

    (predictions, residuals)
}

fn conditional_sum_of_squares(diffs: &[f64], params: &[f64]) -> f64 {
    let (_, residuals) = arma_recursion(diffs, params[0], params[1]);
    residuals.iter().skip(1).map(|e| e * e).sum()
}

/// True when nudging any coefficient leaves the CSS unchanged
///
/// The optimizer reports convergence on such a surface immediately, but
/// the coefficients it returns carry no information.
fn is_flat(diffs: &[f64], point: &[f64], css: f64) -> bool {
    let scale = css.abs().max(f64::MIN_POSITIVE);
    (0..point.len()).all(|i| {
        [PROBE_STEP, -PROBE_STEP].iter().all(|step| {
            let mut probe = point.to_vec();
            probe[i] = (probe[i] + step).clamp(COEFFICIENT_BOUNDS[i].0, COEFFICIENT_BOUNDS[i].1);
            let change = (conditional_sum_of_squares(diffs, &probe) - css).abs();
            change / scale < FLAT_SURFACE_TOLERANCE
        })
    })
}

impl ForecastModel for Arima {
    type Fitted = FittedArima;

    fn fit(&self, series: &ObservationSeries) -> Result<Self::Fitted> {
        series.require(4)?;
        let values = series.values();
        let diffs = difference(values);

        let objective = |params: &[f64]| conditional_sum_of_squares(&diffs, params);
        let minimum = nelder_mead(
            objective,
            &INITIAL_PARAMS,
            Some(&COEFFICIENT_BOUNDS[..]),
            &self.solver_config(),
        )?;

        if !minimum.converged {
            return Err(ForecastError::Convergence(format!(
                "Optimizer stopped after {} iterations without converging",
                minimum.iterations
            )));
        }
        if is_flat(&diffs, &minimum.point, minimum.value) {
            return Err(ForecastError::Convergence(
                "Likelihood surface is flat; coefficients are not identified".to_string(),
            ));
        }

        let (phi, theta) = (minimum.point[0], minimum.point[1]);
        let effective = (diffs.len() - 1) as f64;
        let sigma2 = minimum.value / effective;
        if !sigma2.is_finite() || sigma2 <= f64::EPSILON {
            return Err(ForecastError::Convergence(format!(
                "Degenerate innovation variance {}",
                sigma2
            )));
        }

        let log_likelihood = -0.5 * effective * (1.0 + sigma2.ln() + (2.0 * PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * ESTIMATED_PARAMS as f64;

        let (predictions, residuals) = arma_recursion(&diffs, phi, theta);
        let fitted: Vec<f64> = values
            .iter()
            .zip(&predictions)
            .map(|(level, step)| level + step)
            .collect();

        let rmse = root_mean_squared_error(&values[1..], &fitted)?;
        let mae = mean_absolute_error(&values[1..], &fitted)?;
        if [phi, theta, aic, rmse, mae].iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Convergence(
                "Fit produced non-finite estimates".to_string(),
            ));
        }

        debug!(
            phi,
            theta,
            sigma2,
            aic,
            iterations = minimum.iterations,
            "Fitted ARIMA(1,1,1)"
        );

        Ok(FittedArima {
            phi,
            theta,
            sigma2,
            aic,
            fitted,
            last_value: values[values.len() - 1],
            last_diff: diffs[diffs.len() - 1],
            last_residual: residuals[residuals.len() - 1],
            z_score: self.z_score,
            metrics: AccuracyMetrics::Arima { rmse, mae, aic },
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedArima {
    /// Autoregressive coefficient
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Moving-average coefficient
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// One-step-ahead fitted levels, aligned with observations `1..n`
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    /// Standard error of the level forecast for steps `1..=horizon`
    fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        let mut errors = Vec::with_capacity(horizon);
        let mut psi = 1.0;
        let mut cumulative_psi = 0.0;
        let mut variance_sum = 0.0;

        for j in 0..horizon {
            psi = match j {
                0 => 1.0,
                1 => self.phi + self.theta,
                _ => self.phi * psi,
            };
            cumulative_psi += psi;
            variance_sum += cumulative_psi * cumulative_psi;
            errors.push((self.sigma2 * variance_sum).sqrt());
        }

        errors
    }
}

impl FittedModel for FittedArima {
    fn forecast(&self, horizon: usize) -> Result<ModelForecast> {
        let mut values = Vec::with_capacity(horizon);
        let mut level = self.last_value;
        let mut diff = self.phi * self.last_diff + self.theta * self.last_residual;

        for _ in 0..horizon {
            level += diff;
            values.push(level);
            diff *= self.phi;
        }

        let errors = self.standard_errors(horizon);
        let lower = values
            .iter()
            .zip(&errors)
            .map(|(v, se)| v - self.z_score * se)
            .collect();
        let upper = values
            .iter()
            .zip(&errors)
            .map(|(v, se)| v + self.z_score * se)
            .collect();

        ModelForecast::new_with_intervals(values, lower, upper)
    }

    fn accuracy(&self) -> AccuracyMetrics {
        self.metrics.clone()
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Arima
    }
}
