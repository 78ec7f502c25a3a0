//! Rolling-window statistics
//!
//! Windows are trailing: the statistic at output position `k` summarizes
//! `values[k..k + window]`, i.e. it belongs to input position `k + window - 1`.
//! The first `window - 1` inputs therefore have no value and are not emitted.

use crate::{MathError, Result};
use statrs::statistics::Statistics;

fn check_window(len: usize, window: usize) -> Result<()> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }
    if len < window {
        return Err(MathError::InsufficientData(format!(
            "Not enough data for a rolling window. Need {} values, have {}.",
            window, len
        )));
    }
    Ok(())
}

/// Trailing rolling mean, `values.len() - window + 1` entries long
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    check_window(values.len(), window)?;

    Ok(values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect())
}

/// Trailing rolling sample standard deviation (n - 1 denominator)
///
/// A single-value window has no spread and yields `0.0`.
pub fn rolling_std(values: &[f64], window: usize) -> Result<Vec<f64>> {
    check_window(values.len(), window)?;

    if window == 1 {
        return Ok(vec![0.0; values.len()]);
    }

    Ok(values.windows(window).map(|w| w.std_dev()).collect())
}
