//! Forecast result caching

use crate::forecast::ForecastResult;
use crate::service::{Result, ServiceError};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Key under which a forecast is cached
///
/// A moving-average window and a reference date, when given, are appended
/// so requests that would produce different results never share an entry.
pub fn cache_key(
    dataset_id: u64,
    target_column: &str,
    model_type: &str,
    horizon: usize,
    window: Option<usize>,
    reference_date: Option<NaiveDate>,
) -> String {
    let mut key = format!("forecast:{}_{}_{}_{}", dataset_id, target_column, model_type, horizon);
    if let Some(window) = window {
        key.push_str(&format!("_w{}", window));
    }
    if let Some(date) = reference_date {
        key.push_str(&format!("_r{}", date.format("%Y-%m-%d")));
    }
    key
}

/// Store for finished forecasts
///
/// Failures are reported but callers treat them as misses.
pub trait ForecastCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<ForecastResult>>;

    fn set(&self, key: &str, result: &ForecastResult, ttl: Duration) -> Result<()>;
}

/// Cache that never holds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ForecastCache for NoCache {
    fn get(&self, _key: &str) -> Result<Option<ForecastResult>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _result: &ForecastResult, _ttl: Duration) -> Result<()> {
        Ok(())
    }
}

/// Process-local cache with per-entry expiry
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (Instant, ForecastResult)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until the next purge or `set`
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.lock()?;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, (expires, _)| *expires > now);
        Ok(before - entries.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (Instant, ForecastResult)>>> {
        self.entries
            .lock()
            .map_err(|_| ServiceError::Cache("cache lock poisoned".to_string()))
    }
}

impl ForecastCache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<ForecastResult>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((expires, result)) if *expires > Instant::now() => Ok(Some(result.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, result: &ForecastResult, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        // expired keys that are never read again are dropped here
        entries.retain(|_, (expires, _)| *expires > now);
        entries.insert(key.to_string(), (now + ttl, result.clone()));
        Ok(())
    }
}
