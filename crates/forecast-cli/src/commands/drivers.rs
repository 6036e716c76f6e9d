use clap::Args;
use serde_json::Value;

use forecast_core::drivers;

use super::{load_history_input, HistoryArgs};

/// Arguments for driver derivation
#[derive(Args)]
pub struct DriversArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Derive as of this fiscal year instead of the latest reported
    #[arg(long)]
    pub base_year: Option<i32>,
}

pub fn run_drivers(args: DriversArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_history_input(&args.history, "driver derivation")?;
    let history = match args.base_year.or(request.base_year) {
        Some(year) => request.history.with_base_year(year),
        None => request.history,
    };
    let result = drivers::derive_drivers(&history, &request.config)?;
    Ok(serde_json::to_value(result)?)
}
