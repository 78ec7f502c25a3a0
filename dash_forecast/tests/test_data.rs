use dash_forecast::data::{prepare_series, records_from_csv, records_from_json, MIN_OBSERVATIONS};
use dash_forecast::{ForecastConfig, ForecastError, Record};
use rstest::rstest;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn to_record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_records_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "timestamp,value,label").unwrap();
    writeln!(file, "2023-01-01,100.5,a").unwrap();
    writeln!(file, "2023-01-02,,b").unwrap();
    writeln!(file, "2023-01-03,n/a,c").unwrap();

    let records = records_from_csv(file.path()).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["value"], json!(100.5));
    assert!(!records[1].contains_key("value"));
    assert_eq!(records[2]["value"], json!("n/a"));
    assert_eq!(records[0]["timestamp"], json!("2023-01-01"));
}

#[test]
fn test_records_from_json() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"[{{"timestamp": 1704067200, "value": 1}}, {{"timestamp": 1704153600, "value": "2.5"}}]"#
    )
    .unwrap();

    let records = records_from_json(file.path()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["value"], json!("2.5"));
}

#[test]
fn test_records_from_json_rejects_non_objects() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"[{{"value": 1}}, 7]"#).unwrap();
    assert!(matches!(
        records_from_json(file.path()),
        Err(ForecastError::DataError(_))
    ));

    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"value": 1}}"#).unwrap();
    assert!(records_from_json(file.path()).is_err());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = records_from_csv("/definitely/not/here.csv").unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn test_unix_timestamps_sort_series() {
    let records: Vec<Record> = (0..12)
        .rev()
        .map(|i| to_record(json!({ "timestamp": 1_704_067_200 + i * 86_400, "value": i })))
        .collect();

    let series = prepare_series(&records, "value", MIN_OBSERVATIONS).unwrap();
    let expected: Vec<f64> = (0..12).map(|i| i as f64).collect();
    assert_eq!(series.values(), expected.as_slice());

    let last = series.last_timestamp().unwrap();
    assert_eq!(last.format("%Y-%m-%d").to_string(), "2024-01-12");
}

#[rstest]
#[case(json!(null))]
#[case(json!("abc"))]
#[case(json!(true))]
#[case(json!([1, 2]))]
fn test_unusable_values_are_dropped(#[case] bad: serde_json::Value) {
    let mut records: Vec<Record> = (0..10)
        .map(|i| to_record(json!({ "value": i })))
        .collect();
    records.insert(4, to_record(json!({ "value": bad })));

    let series = prepare_series(&records, "value", MIN_OBSERVATIONS).unwrap();
    assert_eq!(series.len(), 10);
    assert!(series.timestamps().is_none());
}

#[test]
fn test_invalid_timestamp_fails() {
    let mut records: Vec<Record> = (0..10)
        .map(|i| to_record(json!({ "timestamp": format!("2024-01-{:02}", i + 1), "value": i })))
        .collect();
    records.push(to_record(json!({ "timestamp": "yesterday", "value": 3 })));

    assert!(matches!(
        prepare_series(&records, "value", MIN_OBSERVATIONS),
        Err(ForecastError::InvalidTimestamp(_))
    ));
}

#[test]
fn test_configured_minimum_applies() {
    let records: Vec<Record> = (0..6).map(|i| to_record(json!({ "value": i }))).collect();
    let config = ForecastConfig {
        min_observations: 5,
        ..ForecastConfig::default()
    };

    assert!(prepare_series(&records, "value", config.min_observations).is_ok());
    assert!(matches!(
        prepare_series(&records, "value", MIN_OBSERVATIONS),
        Err(ForecastError::InsufficientData { needed: 10, got: 6 })
    ));
}
