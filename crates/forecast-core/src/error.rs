use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Statement;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field} ({reason})")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Missing historical field: {statement}/{field} for {year}")]
    MissingHistoricalField {
        statement: Statement,
        field: String,
        year: i32,
    },

    #[error("Balance sheet does not close in year {year}: difference {difference} exceeds tolerance {tolerance}")]
    Imbalance {
        year: usize,
        /// Closure check less its reference value (zero, or the Year-0 check)
        difference: Decimal,
        tolerance: Decimal,
    },

    #[error("Year slot violation in {schedule} at year {year}: {reason}")]
    SlotViolation {
        schedule: String,
        year: usize,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ForecastError {
    fn from(e: serde_json::Error) -> Self {
        ForecastError::SerializationError(e.to_string())
    }
}
