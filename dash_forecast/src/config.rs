//! Forecasting configuration

use crate::error::Result;
use crate::utils::Frequency;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tunables for the forecasting core and the service around it
///
/// Every field has a default, so a partial JSON document (or `{}`) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Minimum number of valid observations accepted by any model
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Moving-average window used when a request does not set one
    #[serde(default = "default_window")]
    pub default_window: usize,

    /// Half-width of the confidence band in standard errors
    #[serde(default = "default_z_score")]
    pub z_score: f64,

    /// Reject unknown model identifiers instead of defaulting to ARIMA
    #[serde(default)]
    pub strict_model_selection: bool,

    /// Spacing of generated forecast dates
    #[serde(default)]
    pub frequency: Frequency,

    #[serde(default)]
    pub arima: ArimaConfig,

    /// Lifetime of cached forecasts in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Largest horizon the service layer accepts
    #[serde(default = "default_max_horizon")]
    pub max_horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_observations: default_min_observations(),
            default_window: default_window(),
            z_score: default_z_score(),
            strict_model_selection: false,
            frequency: Frequency::default(),
            arima: ArimaConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_horizon: default_max_horizon(),
        }
    }
}

/// Solver settings for the ARIMA estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for ArimaConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
        }
    }
}

impl ForecastConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}

fn default_min_observations() -> usize {
    10
}
fn default_window() -> usize {
    7
}
fn default_z_score() -> f64 {
    1.96
}
fn default_max_iterations() -> usize {
    1000
}
fn default_tolerance() -> f64 {
    1e-8
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_max_horizon() -> usize {
    365
}
