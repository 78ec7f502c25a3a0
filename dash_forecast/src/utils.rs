//! Utility functions for the dash_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spacing between consecutive forecast dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl FromStr for Frequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" | "1d" => Ok(Frequency::Daily),
            "weekly" | "w" | "1w" => Ok(Frequency::Weekly),
            "monthly" | "m" | "1m" => Ok(Frequency::Monthly),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unsupported frequency: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

/// Dates of the `horizon` periods following `last`
pub fn future_dates(last: NaiveDate, horizon: usize, frequency: Frequency) -> Result<Vec<NaiveDate>> {
    let steps = u32::try_from(horizon).map_err(|_| {
        ForecastError::InvalidParameter(format!("Horizon {} is too large for date generation", horizon))
    })?;
    let mut dates = Vec::with_capacity(horizon);

    for step in 1..=steps {
        let next = match frequency {
            Frequency::Daily => last.checked_add_days(Days::new(step as u64)),
            Frequency::Weekly => last.checked_add_days(Days::new(7 * step as u64)),
            Frequency::Monthly => last.checked_add_months(Months::new(step)),
        };
        let next = next.ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Forecast date {} {} periods after {} is out of range",
                frequency, step, last
            ))
        })?;
        dates.push(next);
    }

    Ok(dates)
}

/// Render dates as `YYYY-MM-DD` labels
pub fn date_labels(dates: &[NaiveDate]) -> Vec<String> {
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_dates_cross_month_end() {
        let dates = future_dates(date(2024, 1, 30), 3, Frequency::Daily).unwrap();
        assert_eq!(
            date_labels(&dates),
            vec!["2024-01-31", "2024-02-01", "2024-02-02"]
        );
    }

    #[test]
    fn test_weekly_and_monthly() {
        let weekly = future_dates(date(2024, 1, 1), 2, Frequency::Weekly).unwrap();
        assert_eq!(weekly, vec![date(2024, 1, 8), date(2024, 1, 15)]);

        let monthly = future_dates(date(2024, 1, 31), 2, Frequency::Monthly).unwrap();
        assert_eq!(monthly, vec![date(2024, 2, 29), date(2024, 3, 31)]);
    }

    #[test]
    fn test_oversized_horizon_is_rejected() {
        let start = date(2024, 1, 1);
        let err = future_dates(start, usize::MAX, Frequency::Daily).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));

        let err = future_dates(NaiveDate::MAX, 1, Frequency::Monthly).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("hourly".parse::<Frequency>().is_err());
    }
}
