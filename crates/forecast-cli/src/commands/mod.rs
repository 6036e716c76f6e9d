pub mod backtest;
pub mod debt;
pub mod drivers;
pub mod forecast;

use clap::Args;
use forecast_core::config::{DriverConfig, ForecastPolicy};
use forecast_core::forecast::HistoryForecastInput;
use tracing::debug;

use crate::input;

/// Input and configuration flags shared by every history-driven command.
#[derive(Args)]
pub struct HistoryArgs {
    /// Path to a JSON or YAML document with `history` and optional
    /// `config`, `policy` and `base_year`
    #[arg(long)]
    pub input: Option<String>,

    /// Driver configuration file (JSON or YAML); replaces the input's config
    #[arg(long)]
    pub config: Option<String>,

    /// Forecast policy file (JSON or YAML); replaces the input's policy
    #[arg(long)]
    pub policy: Option<String>,

    /// Historical years averaged for each driver
    #[arg(long)]
    pub lookback: Option<usize>,

    /// Years to project
    #[arg(long)]
    pub years: Option<usize>,
}

/// Load the history document from `--input` or stdin and apply flag overrides.
pub fn load_history_input(
    args: &HistoryArgs,
    command: &str,
) -> Result<HistoryForecastInput, Box<dyn std::error::Error>> {
    let mut request: HistoryForecastInput = input::read_input(args.input.as_deref(), command)?;

    if let Some(ref path) = args.config {
        let config: DriverConfig = input::file::read_document(path)?;
        request.config = config;
    }
    if let Some(ref path) = args.policy {
        let policy: ForecastPolicy = input::file::read_document(path)?;
        request.policy = policy;
    }
    if let Some(n) = args.lookback {
        request.config.n_input_years = n;
    }
    if let Some(n) = args.years {
        request.config.n_forecast_years = n;
    }
    request.config.validate()?;

    debug!(
        lookback = request.config.n_input_years,
        horizon = request.config.n_forecast_years,
        "history input loaded"
    );
    Ok(request)
}
