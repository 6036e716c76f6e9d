use clap::Args;
use serde_json::Value;

use forecast_core::forecast::{self, ForecastInput};

use super::{load_history_input, HistoryArgs};
use crate::input;

/// Arguments for a forecast from historical statements
#[derive(Args)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Forecast from this fiscal year instead of the latest reported
    #[arg(long)]
    pub base_year: Option<i32>,

    /// Fail unless every balance sheet closes within this absolute tolerance
    #[arg(long)]
    pub strict: Option<rust_decimal::Decimal>,
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request = load_history_input(&args.history, "forecast")?;
    if args.base_year.is_some() {
        request.base_year = args.base_year;
    }
    let result = forecast::forecast_from_history(&request)?;
    if let Some(tolerance) = args.strict {
        forecast::verify_closure(&result.result.forecast.balance_sheets, tolerance)?;
    }
    Ok(serde_json::to_value(result)?)
}

/// Arguments for a forecast from prepared fundamentals and drivers
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to a JSON or YAML document with `fundamentals`, `drivers` and
    /// optional `policy`
    #[arg(long)]
    pub input: Option<String>,

    /// Fail unless every balance sheet closes within this absolute tolerance
    #[arg(long)]
    pub strict: Option<rust_decimal::Decimal>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project_input: ForecastInput = input::read_input(args.input.as_deref(), "projection")?;
    let result = forecast::build_forecast(&project_input)?;
    if let Some(tolerance) = args.strict {
        forecast::verify_closure(&result.result.balance_sheets, tolerance)?;
    }
    Ok(serde_json::to_value(result)?)
}
