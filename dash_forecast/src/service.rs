//! Dataset-level forecasting on top of injected storage, cache and notifier
//!
//! The forecasting core never touches storage; this layer loads a dataset's
//! records, runs the [`Forecaster`], persists the outcome and keeps the cache
//! and subscribers informed. Cache and notifier failures are logged and
//! otherwise ignored.

use crate::cache::{cache_key, ForecastCache, NoCache};
use crate::config::ForecastConfig;
use crate::data::Record;
use crate::error::ForecastError;
use crate::forecast::{ConfidenceInterval, ForecastRequest, ForecastResult, Forecaster};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Largest page of forecast history
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Errors raised by the service layer and its collaborators
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Dataset {0} not found")]
    DatasetNotFound(u64),

    #[error("Horizon {horizon} outside allowed range 1..={max}")]
    HorizonOutOfRange { horizon: usize, max: usize },

    #[error("History limit {0} outside allowed range 1..=100")]
    InvalidLimit(usize),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error(transparent)]
    Forecast(#[from] ForecastError),
}

impl ServiceError {
    /// True when the request itself is at fault rather than the backend
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::DatasetNotFound(_)
            | ServiceError::HorizonOutOfRange { .. }
            | ServiceError::InvalidLimit(_) => true,
            ServiceError::Forecast(ForecastError::FitError(_) | ForecastError::Convergence(_)) => false,
            ServiceError::Forecast(e) => !e.is_retryable(),
            ServiceError::Storage(_) | ServiceError::Cache(_) | ServiceError::Notify(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// A forecast as persisted for a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Assigned by the store
    pub id: Option<u64>,
    pub dataset_id: u64,
    /// Model that delivered the forecast
    pub model_type: String,
    pub target_column: String,
    pub predictions: Vec<f64>,
    pub confidence_interval: ConfidenceInterval,
    pub accuracy_metrics: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
}

impl ForecastRecord {
    pub fn from_result(dataset_id: u64, result: &ForecastResult) -> Self {
        Self {
            id: None,
            dataset_id,
            model_type: result.model_type_used().as_str().to_string(),
            target_column: result.target_column.clone(),
            predictions: result.predictions.clone(),
            confidence_interval: result.confidence_interval.clone(),
            accuracy_metrics: result.metrics_map(),
            created_at: Utc::now(),
        }
    }
}

/// Source of dataset records and sink for finished forecasts
pub trait DatasetStore: Send + Sync {
    fn dataset_exists(&self, dataset_id: u64) -> Result<bool>;

    /// All records of a dataset, or `None` when it does not exist
    fn records(&self, dataset_id: u64) -> Result<Option<Vec<Record>>>;

    /// Persist a forecast and return it with its assigned id
    fn save_forecast(&self, record: ForecastRecord) -> Result<ForecastRecord>;

    /// Stored forecasts for a dataset, newest first
    fn forecast_history(&self, dataset_id: u64, limit: usize) -> Result<Vec<ForecastRecord>>;
}

/// Receiver of finished forecasts, e.g. a websocket broadcaster
pub trait ForecastNotifier: Send + Sync {
    fn notify(&self, dataset_id: u64, result: &ForecastResult) -> Result<()>;
}

/// Notifier that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotifier;

impl ForecastNotifier for NoNotifier {
    fn notify(&self, _dataset_id: u64, _result: &ForecastResult) -> Result<()> {
        Ok(())
    }
}

/// Forecasting for stored datasets
pub struct ForecastService<S, C = NoCache, N = NoNotifier> {
    store: S,
    cache: C,
    notifier: N,
    forecaster: Forecaster,
}

impl<S: DatasetStore> ForecastService<S, NoCache, NoNotifier> {
    /// Service without cache or notifications
    pub fn new(store: S, config: ForecastConfig) -> Self {
        Self::with_parts(store, NoCache, NoNotifier, config)
    }
}

impl<S, C, N> ForecastService<S, C, N>
where
    S: DatasetStore,
    C: ForecastCache,
    N: ForecastNotifier,
{
    pub fn with_parts(store: S, cache: C, notifier: N, config: ForecastConfig) -> Self {
        Self {
            store,
            cache,
            notifier,
            forecaster: Forecaster::new(config),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &ForecastConfig {
        self.forecaster.config()
    }

    /// Forecast a dataset, serving from cache when possible
    ///
    /// Fresh results are persisted, cached and announced; cached ones are
    /// returned as-is.
    pub fn forecast(&self, dataset_id: u64, request: &ForecastRequest) -> Result<ForecastResult> {
        let max = self.config().max_horizon;
        if request.horizon == 0 || request.horizon > max {
            return Err(ServiceError::HorizonOutOfRange {
                horizon: request.horizon,
                max,
            });
        }

        if !self.store.dataset_exists(dataset_id)? {
            return Err(ServiceError::DatasetNotFound(dataset_id));
        }

        let key = cache_key(
            dataset_id,
            &request.target_column,
            &request.model_type,
            request.horizon,
            request.window,
            request.reference_date,
        );
        match self.cache.get(&key) {
            Ok(Some(cached)) => {
                debug!(dataset_id, key = %key, "Serving cached forecast");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(dataset_id, error = %e, "Cache lookup failed"),
        }

        let records = self
            .store
            .records(dataset_id)?
            .ok_or(ServiceError::DatasetNotFound(dataset_id))?;

        let result = self.forecaster.forecast(&records, request)?;

        let saved = self
            .store
            .save_forecast(ForecastRecord::from_result(dataset_id, &result))?;
        info!(
            dataset_id,
            forecast_id = saved.id,
            model = %result.model_type_used(),
            "Stored forecast"
        );

        let ttl = Duration::from_secs(self.config().cache_ttl_secs);
        if let Err(e) = self.cache.set(&key, &result, ttl) {
            warn!(dataset_id, error = %e, "Failed to cache forecast");
        }
        if let Err(e) = self.notifier.notify(dataset_id, &result) {
            warn!(dataset_id, error = %e, "Failed to notify forecast subscribers");
        }

        Ok(result)
    }

    /// Stored forecasts for a dataset, newest first
    pub fn history(&self, dataset_id: u64, limit: usize) -> Result<Vec<ForecastRecord>> {
        if limit == 0 || limit > MAX_HISTORY_LIMIT {
            return Err(ServiceError::InvalidLimit(limit));
        }
        if !self.store.dataset_exists(dataset_id)? {
            return Err(ServiceError::DatasetNotFound(dataset_id));
        }
        self.store.forecast_history(dataset_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;

    #[test]
    fn test_error_classes() {
        assert!(ServiceError::DatasetNotFound(3).is_client_error());
        assert!(ServiceError::Forecast(ForecastError::MissingColumn("x".into())).is_client_error());
        assert!(!ServiceError::Storage("down".into()).is_client_error());
        assert!(!ServiceError::Forecast(ForecastError::IoError(std::io::Error::other("eof")))
            .is_client_error());
        assert!(!ServiceError::Forecast(ForecastError::FitError("singular".into())).is_client_error());
        assert!(!ServiceError::Forecast(ForecastError::Convergence("max iterations".into()))
            .is_client_error());
        assert!(ServiceError::Forecast(ForecastError::UnknownModel("prophet".into())).is_client_error());
    }

    #[test]
    fn test_record_from_result_uses_delivered_model() {
        let mut values = vec![2.0; 11];
        values.push(20.0);
        let records: Vec<Record> = values
            .iter()
            .map(|v| serde_json::json!({ "value": v }).as_object().cloned().unwrap())
            .collect();

        let result = crate::forecast::generate_forecast(&records, "value", "arima", 3).unwrap();
        let record = ForecastRecord::from_result(9, &result);

        assert_eq!(record.dataset_id, 9);
        assert_eq!(record.model_type, ModelKind::LinearRegression.as_str());
        assert!(record.accuracy_metrics.contains_key("r2_score"));
        assert_eq!(record.predictions.len(), 3);
    }
}
