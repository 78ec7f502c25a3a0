//! # Dash Forecast
//!
//! Forecasting engine behind the InsightDash dashboard: turns a dataset's
//! records into predictions with confidence bounds and fit diagnostics.
//!
//! ## Features
//!
//! - Series preparation from heterogeneous JSON records, CSV or JSON files
//! - Models: ARIMA(1,1,1), linear trend regression, simple moving average
//! - Automatic fallback to linear regression when ARIMA does not converge
//! - Per-model accuracy metrics and generated forecast dates
//! - Service layer over injected dataset storage, cache and notifier
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dash_forecast::data::records_from_csv;
//! use dash_forecast::{ForecastConfig, ForecastRequest, Forecaster};
//!
//! # fn main() -> dash_forecast::Result<()> {
//! // Load records, one per CSV row
//! let records = records_from_csv("sales.csv")?;
//!
//! // Forecast the next 14 days with a 5-point moving average
//! let forecaster = Forecaster::new(ForecastConfig::default());
//! let request = ForecastRequest::new("revenue", "moving_average", 14).with_window(5);
//! let result = forecaster.forecast(&records, &request)?;
//!
//! for (date, value) in result.date_labels().iter().zip(&result.predictions) {
//!     println!("{}: {:.2}", date, value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod models;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use crate::cache::{cache_key, ForecastCache, InMemoryCache, NoCache};
pub use crate::config::ForecastConfig;
pub use crate::data::{prepare_series, ObservationSeries, Record};
pub use crate::error::{ForecastError, Result};
pub use crate::forecast::{
    generate_forecast, ConfidenceInterval, ForecastRequest, ForecastResult, Forecaster,
    ModelOutcome,
};
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::{FittedModel, ForecastModel, ModelKind};
pub use crate::service::{
    DatasetStore, ForecastNotifier, ForecastRecord, ForecastService, NoNotifier, ServiceError,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
