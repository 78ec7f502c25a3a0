//! # insight-forecast
//!
//! Command-line front end for the forecasting engine: reads a CSV or JSON
//! file of records and prints the forecast as JSON.

use clap::Parser;
use dash_forecast::data::{records_from_csv, records_from_json};
use dash_forecast::{ForecastConfig, ForecastRequest, Forecaster};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "insight-forecast")]
#[command(about = "Forecast a numeric column of a CSV or JSON dataset", long_about = None)]
struct Cli {
    /// Input file (CSV with a header row, or a JSON array of objects)
    #[arg(short, long)]
    input: PathBuf,

    /// Column holding the values to forecast
    #[arg(short, long, default_value = "value")]
    target: String,

    /// Model type (arima, linear_regression, moving_average)
    #[arg(short, long, default_value = "arima")]
    model: String,

    /// Number of periods to forecast
    #[arg(long, default_value = "30")]
    horizon: usize,

    /// Moving-average window
    #[arg(short, long)]
    window: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_records(path: &Path) -> dash_forecast::Result<Vec<dash_forecast::Record>> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        records_from_json(path)
    } else {
        records_from_csv(path)
    }
}

fn run(cli: Cli) -> dash_forecast::Result<String> {
    let config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };

    let records = load_records(&cli.input)?;

    let mut request = ForecastRequest::new(cli.target, cli.model, cli.horizon);
    request.window = cli.window;

    let result = Forecaster::new(config).forecast(&records, &request)?;
    Ok(serde_json::to_string_pretty(&result)?)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Forecast failed");
            ExitCode::FAILURE
        }
    }
}
