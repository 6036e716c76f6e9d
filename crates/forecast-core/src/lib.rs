pub mod arena;
pub mod config;
pub mod debt;
pub mod drivers;
pub mod error;
pub mod forecast;
pub mod fundamentals;
pub mod history;
pub mod projection;
pub mod statements;
pub mod types;

mod validation;

#[cfg(feature = "backtest")]
pub mod backtest;

#[cfg(test)]
mod test_fixtures;

pub use error::ForecastError;
pub use types::*;

pub type ForecastResult<T> = Result<T, ForecastError>;
