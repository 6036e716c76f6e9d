use rust_decimal::Decimal;

use crate::error::ForecastError;
use crate::types::{Money, Rate};
use crate::ForecastResult;

pub(crate) fn validate_non_negative(field: &str, value: Money) -> ForecastResult<()> {
    if value < Decimal::ZERO {
        return Err(ForecastError::InvalidInput {
            field: field.into(),
            reason: format!("Value must be non-negative, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn validate_rate(field: &str, value: Rate) -> ForecastResult<()> {
    validate_within(field, value, Decimal::ZERO, Decimal::ONE)
}

pub(crate) fn validate_within(
    field: &str,
    value: Decimal,
    min: Decimal,
    max: Decimal,
) -> ForecastResult<()> {
    if value < min || value > max {
        return Err(ForecastError::InvalidConfiguration {
            field: field.into(),
            reason: format!("Must be between {min} and {max}, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn validate_positive(field: &str, value: Decimal) -> ForecastResult<()> {
    if value <= Decimal::ZERO {
        return Err(ForecastError::InvalidConfiguration {
            field: field.into(),
            reason: format!("Must be greater than zero, got {value}"),
        });
    }
    Ok(())
}

pub(crate) fn validate_horizon(field: &str, years: usize) -> ForecastResult<()> {
    if years == 0 {
        return Err(ForecastError::InvalidConfiguration {
            field: field.into(),
            reason: "Forecast horizon must be at least one year".into(),
        });
    }
    Ok(())
}
