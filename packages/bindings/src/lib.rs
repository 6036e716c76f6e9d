use napi::Result as NapiResult;
use napi_derive::napi;

use forecast_core::backtest::{self, BacktestInput};
use forecast_core::debt::{self, DebtScheduleInput};
use forecast_core::drivers;
use forecast_core::forecast::{self, ForecastInput, HistoryForecastInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Input: `{ history, config?, base_year? }`.
#[napi]
pub fn derive_drivers(input_json: String) -> NapiResult<String> {
    let input: HistoryForecastInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let history = match input.base_year {
        Some(year) => input.history.with_base_year(year),
        None => input.history,
    };
    let output = drivers::derive_drivers(&history, &input.config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn run_forecast(input_json: String) -> NapiResult<String> {
    let input: ForecastInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = forecast::build_forecast(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn forecast_from_history(input_json: String) -> NapiResult<String> {
    let input: HistoryForecastInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = forecast::forecast_from_history(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Debt
// ---------------------------------------------------------------------------

#[napi]
pub fn debt_schedule(input_json: String) -> NapiResult<String> {
    let input: DebtScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = debt::build_debt_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Backtest
// ---------------------------------------------------------------------------

#[napi]
pub fn run_backtest(input_json: String) -> NapiResult<String> {
    let input: BacktestInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = backtest::run_backtest(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
