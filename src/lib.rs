//! # InsightDash
//!
//! `insight_dash` bundles the forecasting side of the InsightDash dashboard
//! backend: the [`forecast`] engine and the numerical building blocks in
//! [`math`].
//!
//! ## Example
//!
//! ```
//! use insight_dash::forecast::{generate_forecast, ModelKind, Record};
//! use serde_json::json;
//!
//! let records: Vec<Record> = (0..12)
//!     .map(|i| json!({ "value": 2.0 * i as f64 }).as_object().cloned().unwrap())
//!     .collect();
//!
//! let result = generate_forecast(&records, "value", "moving_average", 3).unwrap();
//! assert_eq!(result.model_type_used(), ModelKind::MovingAverage);
//! assert_eq!(result.predictions, vec![16.0; 3]);
//! ```

pub use dash_forecast as forecast;
pub use series_math as math;

/// Model identifiers accepted by [`forecast::generate_forecast`]
pub fn supported_models() -> [&'static str; 3] {
    [
        forecast::ModelKind::Arima.as_str(),
        forecast::ModelKind::LinearRegression.as_str(),
        forecast::ModelKind::MovingAverage.as_str(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_models_parse() {
        for name in supported_models() {
            assert!(name.parse::<forecast::ModelKind>().is_ok());
        }
    }

    #[test]
    fn test_math_reexport() {
        let means = math::rolling_mean(&[1.0, 2.0, 3.0], 2).unwrap();
        assert_eq!(means, vec![1.5, 2.5]);
    }

    #[test]
    fn test_forecast_version() {
        assert_eq!(forecast::NAME, "dash_forecast");
    }
}
