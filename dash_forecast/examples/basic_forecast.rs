use dash_forecast::{ForecastConfig, ForecastRequest, Forecaster, Record};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Dash Forecast: Basic Forecasting Example");
    println!("========================================\n");

    println!("Creating sample data...");
    let records = create_sample_records();
    println!("Sample data created: {} daily records\n", records.len());

    let forecaster = Forecaster::new(ForecastConfig::default());

    for model in ["arima", "linear_regression", "moving_average"] {
        let request = ForecastRequest::new("visitors", model, 7);
        let result = forecaster.forecast(&records, &request)?;

        println!("Model requested: {}", model);
        println!("Model used:      {}", result.model_type_used());
        if let dash_forecast::ModelOutcome::Substituted { reason, .. } = &result.model {
            println!("Fallback reason: {}", reason);
        }

        let interval = &result.confidence_interval;
        for (i, date) in result.date_labels().iter().enumerate() {
            println!(
                "  {}: {:.1} ({:.1}, {:.1})",
                date, result.predictions[i], interval.lower[i], interval.upper[i]
            );
        }
        println!("{}", result.accuracy_metrics);
    }

    Ok(())
}

/// Ninety days of visitor counts with a trend and a weekly cycle
fn create_sample_records() -> Vec<Record> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid start date");

    (0..90)
        .filter_map(|day| {
            let date = start + chrono::Days::new(day);
            let weekly = 25.0 * (2.0 * std::f64::consts::PI * day as f64 / 7.0).sin();
            let visitors = 500.0 + 2.5 * day as f64 + weekly;

            json!({
                "timestamp": date.format("%Y-%m-%d").to_string(),
                "visitors": visitors,
            })
            .as_object()
            .cloned()
        })
        .collect()
}
