//! Turning raw records into an ordered observation series

use crate::error::{ForecastError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// One heterogeneous input row: field name to JSON value
pub type Record = Map<String, Value>;

/// Field holding the observation instant
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Smallest series any model accepts
pub const MIN_OBSERVATIONS: usize = 10;

/// Ordered numeric observations ready for fitting
///
/// Time-indexed series carry one timestamp per value, sorted ascending.
/// Ordinal series come from records without timestamps and are indexed by
/// their original position.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    timestamps: Option<Vec<DateTime<Utc>>>,
    // calendar date of the latest observation in its own offset
    last_date: Option<NaiveDate>,
    values: Vec<f64>,
}

impl ObservationSeries {
    /// Build a time-indexed series; pairs are sorted by timestamp
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Timestamps length ({}) doesn't match values length ({})",
                timestamps.len(),
                values.len()
            )));
        }
        check_values(&values)?;

        let mut pairs: Vec<(DateTime<Utc>, f64)> = timestamps.into_iter().zip(values).collect();
        pairs.sort_by_key(|(ts, _)| *ts);
        let last_date = pairs.last().map(|(ts, _)| ts.date_naive());
        let (timestamps, values) = pairs.into_iter().unzip();

        Ok(Self {
            timestamps: Some(timestamps),
            last_date,
            values,
        })
    }

    /// Build a series indexed only by position
    pub fn ordinal(values: Vec<f64>) -> Result<Self> {
        check_values(&values)?;
        Ok(Self {
            timestamps: None,
            last_date: None,
            values,
        })
    }

    /// Observed values in series order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamps, if the series is time-indexed
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Timestamp of the most recent observation
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.as_ref().and_then(|ts| ts.last().copied())
    }

    /// Calendar date of the most recent observation
    ///
    /// Taken in the offset the timestamp was written with, so
    /// `2024-01-12T22:00:00-05:00` gives 2024-01-12 even though the UTC
    /// instant falls on the 13th.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.last_date
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless the series holds at least `needed` observations
    pub fn require(&self, needed: usize) -> Result<()> {
        if self.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: self.len(),
            });
        }
        Ok(())
    }
}

fn check_values(values: &[f64]) -> Result<()> {
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::DataError(format!(
            "Value at position {} is not finite",
            pos
        )));
    }
    Ok(())
}

/// Extract `target` from every record and order the result
///
/// Records whose target is absent, null, non-numeric or non-finite are
/// dropped. When any record has a `timestamp` field the series is sorted by
/// it (stable, so equal instants keep input order) and records lacking a
/// timestamp are dropped; otherwise record position is the index.
pub fn prepare_series(records: &[Record], target: &str, min_observations: usize) -> Result<ObservationSeries> {
    if !records.iter().any(|r| r.contains_key(target)) {
        return Err(ForecastError::MissingColumn(target.to_string()));
    }

    let time_indexed = records.iter().any(|r| r.contains_key(TIMESTAMP_FIELD));

    let series = if time_indexed {
        let mut pairs = Vec::with_capacity(records.len());
        for record in records {
            let Some(value) = record.get(target).and_then(numeric_value) else {
                continue;
            };
            let timestamp = match record.get(TIMESTAMP_FIELD) {
                None | Some(Value::Null) => continue,
                Some(raw) => parse_timestamp_local(raw)?,
            };
            pairs.push((timestamp, value));
        }

        // ordering on DateTime<FixedOffset> compares instants
        pairs.sort_by_key(|(ts, _)| *ts);
        let last_date = pairs.last().map(|(ts, _)| ts.date_naive());
        let (timestamps, values) = pairs
            .into_iter()
            .map(|(ts, value)| (ts.with_timezone(&Utc), value))
            .unzip();
        ObservationSeries {
            timestamps: Some(timestamps),
            last_date,
            values,
        }
    } else {
        let values = records
            .iter()
            .filter_map(|r| r.get(target).and_then(numeric_value))
            .collect();
        ObservationSeries {
            timestamps: None,
            last_date: None,
            values,
        }
    };

    debug!(
        records = records.len(),
        kept = series.len(),
        time_indexed,
        column = target,
        "Prepared observation series"
    );

    series.require(min_observations)?;
    Ok(series)
}

/// Interpret a JSON value as a finite number
fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Parse a timestamp field into a UTC instant
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` (taken as UTC),
/// plain dates, and numeric Unix seconds.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    parse_timestamp_local(value).map(|ts| ts.with_timezone(&Utc))
}

/// Parse a timestamp field keeping the offset it was written with
///
/// Inputs without an offset come back at `+00:00`.
pub fn parse_timestamp_local(value: &Value) -> Result<DateTime<FixedOffset>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => from_unix_seconds(n).map(DateTime::from),
        other => Err(ForecastError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_timestamp_str(s: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)).into());
    }

    Err(ForecastError::InvalidTimestamp(s.to_string()))
}

fn from_unix_seconds(n: &Number) -> Result<DateTime<Utc>> {
    let parsed = if let Some(secs) = n.as_i64() {
        DateTime::from_timestamp(secs, 0)
    } else {
        n.as_f64().filter(|v| v.is_finite()).and_then(|secs| {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round() as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        })
    };

    parsed.ok_or_else(|| ForecastError::InvalidTimestamp(n.to_string()))
}

/// Load records from a CSV file with a header row
///
/// Cells that parse as numbers become JSON numbers, empty cells are left
/// out, everything else is kept as a string.
pub fn records_from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let value = match cell.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(cell.to_string()),
            };
            record.insert(name.to_string(), value);
        }
        records.push(record);
    }

    Ok(records)
}

/// Load records from a JSON file holding an array of objects
pub fn records_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    let value: Value = serde_json::from_reader(BufReader::new(file))?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(map) => Ok(map),
                _ => Err(ForecastError::DataError(format!(
                    "Element {} is not a JSON object",
                    idx
                ))),
            })
            .collect(),
        _ => Err(ForecastError::DataError(
            "Expected a JSON array of records".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test records must be objects"),
        }
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        for raw in [
            json!("2024-03-01T12:30:00Z"),
            json!("2024-03-01T14:30:00+02:00"),
            json!("2024-03-01 12:30:00"),
            json!("2024-03-01T12:30:00.000"),
            json!(expected.timestamp()),
        ] {
            assert_eq!(parse_timestamp(&raw).unwrap(), expected, "{}", raw);
        }

        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&json!("2024-03-01")).unwrap(), midnight);

        assert!(matches!(
            parse_timestamp(&json!("yesterday")),
            Err(ForecastError::InvalidTimestamp(_))
        ));
        assert!(parse_timestamp(&json!(true)).is_err());
    }

    #[test]
    fn test_sorts_by_timestamp_and_drops_missing() {
        let mut records: Vec<Record> = (0..12)
            .rev()
            .map(|i| record(json!({"timestamp": format!("2024-01-{:02}", i + 1), "value": i})))
            .collect();
        records.push(record(json!({"timestamp": "2024-02-01", "value": null})));
        records.push(record(json!({"timestamp": "2024-02-02", "other": 1})));
        records.push(record(json!({"value": 99})));

        let series = prepare_series(&records, "value", MIN_OBSERVATIONS).unwrap();

        assert_eq!(series.len(), 12);
        assert_eq!(series.values()[0], 0.0);
        assert_eq!(series.values()[11], 11.0);
        assert_eq!(
            series.last_timestamp().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 12, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_last_date_keeps_written_offset() {
        let records: Vec<Record> = (1..=10)
            .map(|d| record(json!({"timestamp": format!("2024-01-{:02}T22:00:00-05:00", d), "value": d})))
            .collect();

        let series = prepare_series(&records, "value", MIN_OBSERVATIONS).unwrap();
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(
            series.last_timestamp().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 11, 3, 0, 0).unwrap()
        );

        let local = parse_timestamp_local(&json!("2024-01-10T22:00:00-05:00")).unwrap();
        assert_eq!(local.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(parse_timestamp_local(&json!("2024-01-10")).unwrap().offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let records: Vec<Record> = (0..10)
            .map(|i| record(json!({"timestamp": "2024-01-01", "value": i})))
            .collect();

        let series = prepare_series(&records, "value", MIN_OBSERVATIONS).unwrap();
        let expected: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(series.values(), expected.as_slice());
    }

    #[test]
    fn test_ordinal_series_without_timestamps() {
        let records: Vec<Record> = (0..10)
            .map(|i| record(json!({"sales": format!("{}.5", i), "region": "north"})))
            .collect();

        let series = prepare_series(&records, "sales", MIN_OBSERVATIONS).unwrap();
        assert!(series.timestamps().is_none());
        assert_eq!(series.values()[3], 3.5);
    }

    #[test]
    fn test_missing_column_and_insufficient_data() {
        let records: Vec<Record> = (0..20).map(|i| record(json!({"value": i}))).collect();
        assert!(matches!(
            prepare_series(&records, "revenue", MIN_OBSERVATIONS),
            Err(ForecastError::MissingColumn(col)) if col == "revenue"
        ));

        let records: Vec<Record> = (0..9).map(|i| record(json!({"value": i}))).collect();
        assert!(matches!(
            prepare_series(&records, "value", MIN_OBSERVATIONS),
            Err(ForecastError::InsufficientData { needed: 10, got: 9 })
        ));
    }

    #[test]
    fn test_bad_timestamp_fails() {
        let mut records: Vec<Record> = (0..10)
            .map(|i| record(json!({"timestamp": "2024-01-01", "value": i})))
            .collect();
        records[4].insert("timestamp".to_string(), json!("not a date"));

        assert!(matches!(
            prepare_series(&records, "value", MIN_OBSERVATIONS),
            Err(ForecastError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_constructors_validate_values() {
        assert!(ObservationSeries::ordinal(vec![1.0, f64::NAN]).is_err());
        assert!(ObservationSeries::new(vec![], vec![1.0]).is_err());

        let later = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series = ObservationSeries::new(vec![later, earlier], vec![2.0, 1.0]).unwrap();
        assert_eq!(series.values(), &[1.0, 2.0]);
    }
}
