use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use forecast_core::debt::{self, DebtScheduleInput};

use crate::input;

/// Arguments for a standalone debt ledger
#[derive(Args)]
pub struct DebtScheduleArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Opening short-term debt
    #[arg(long)]
    pub short_term_debt: Option<Decimal>,

    /// Opening long-term debt
    #[arg(long)]
    pub long_term_debt: Option<Decimal>,

    /// Years left on the opening long-term debt
    #[arg(long)]
    pub legacy_term: Option<Decimal>,

    /// Term of new long-term loans in years
    #[arg(long, default_value = "10")]
    pub lt_loan_years: Decimal,

    /// Years to roll forward
    #[arg(long, default_value_t = 5)]
    pub horizon: usize,

    /// New short-term loans per year (comma-separated, year 1 first)
    #[arg(long, value_delimiter = ',')]
    pub new_st_loans: Option<Vec<Decimal>>,

    /// New long-term loans per year (comma-separated, year 1 first)
    #[arg(long, value_delimiter = ',')]
    pub new_lt_loans: Option<Vec<Decimal>>,

    /// Rate charged on opening total debt
    #[arg(long)]
    pub interest_rate: Option<Decimal>,
}

pub fn run_debt_schedule(args: DebtScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: DebtScheduleInput = if let Some(document) =
        input::read_optional_input(args.input.as_deref())?
    {
        document
    } else {
        let long_term_debt = args.long_term_debt.unwrap_or(Decimal::ZERO);
        let legacy_term = match args.legacy_term {
            Some(term) => term,
            None if long_term_debt.is_zero() => args.lt_loan_years,
            None => return Err("--legacy-term is required with --long-term-debt".into()),
        };
        DebtScheduleInput {
            short_term_debt: args.short_term_debt.unwrap_or(Decimal::ZERO),
            long_term_debt,
            legacy_term,
            lt_loan_years: args.lt_loan_years,
            horizon: args.horizon,
            new_short_term_loans: args.new_st_loans.unwrap_or_default(),
            new_long_term_loans: args.new_lt_loans.unwrap_or_default(),
            interest_rate: args.interest_rate,
        }
    };
    let result = debt::build_debt_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
