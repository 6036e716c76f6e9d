use clap::Args;
use serde_json::Value;

use forecast_core::backtest::{self, BacktestInput};

use super::{load_history_input, HistoryArgs};

/// Arguments for a backtest against reported actuals
#[derive(Args)]
pub struct BacktestArgs {
    #[command(flatten)]
    pub history: HistoryArgs,

    /// Fiscal year to forecast from; later years are scored
    #[arg(long)]
    pub base_year: Option<i32>,
}

pub fn run_backtest(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = load_history_input(&args.history, "backtest")?;
    let base_year = args
        .base_year
        .or(request.base_year)
        .ok_or("--base-year is required (or set base_year in the input)")?;
    let result = backtest::run_backtest(&BacktestInput {
        history: request.history,
        base_year,
        config: request.config,
        policy: request.policy,
    })?;
    Ok(serde_json::to_value(result)?)
}
