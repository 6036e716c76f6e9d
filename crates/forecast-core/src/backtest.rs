use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

use crate::config::{DriverConfig, ForecastPolicy};
use crate::error::ForecastError;
use crate::forecast::{forecast_from_history, ForecastOutput, HistoryForecastInput};
use crate::history::{fields, HistoricalSource, StatementHistory};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, Statement};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Forecast from `base_year` and score it against the later actuals in
/// `history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestInput {
    pub history: StatementHistory,
    pub base_year: i32,
    #[serde(default)]
    pub config: DriverConfig,
    #[serde(default)]
    pub policy: ForecastPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestEntry {
    pub fiscal_year: i32,
    pub statement: Statement,
    pub line_item: String,
    pub forecast: Money,
    pub actual: Money,
    /// forecast - actual
    pub difference: Money,
    /// difference / |actual|; absent when the actual is zero
    pub pct_difference: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub base_year: i32,
    pub years_compared: Vec<i32>,
    pub entries: Vec<BacktestEntry>,
    /// Mean |pct_difference| per line item
    pub mean_abs_pct_error: BTreeMap<String, Rate>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

type Extractor = fn(&ForecastOutput, usize) -> Money;

/// Forecast line items paired with the reported line item they predict.
const COMPARED: &[(Statement, &str, Extractor)] = &[
    (Statement::Income, fields::TOTAL_REVENUE, |o, k| {
        o.income_statements[k].revenue
    }),
    (Statement::Income, fields::COST_OF_REVENUE, |o, k| {
        o.income_statements[k].cogs
    }),
    (Statement::Income, fields::SGA, |o, k| o.income_statements[k].sga),
    (Statement::Income, fields::OPERATING_INCOME, |o, k| {
        o.income_statements[k].operating_income
    }),
    (Statement::Income, fields::INTEREST_EXPENSE, |o, k| {
        o.income_statements[k].interest_expense
    }),
    (Statement::Income, fields::NET_INCOME, |o, k| {
        o.income_statements[k].net_income
    }),
    (Statement::Balance, fields::ACCOUNTS_RECEIVABLE, |o, k| {
        o.balance_sheets[k].accounts_receivable
    }),
    (Statement::Balance, fields::INVENTORY, |o, k| {
        o.balance_sheets[k].inventory
    }),
    (Statement::Balance, fields::NET_PPE, |o, k| o.balance_sheets[k].net_ppe),
    (Statement::Balance, fields::ACCOUNTS_PAYABLE, |o, k| {
        o.balance_sheets[k].accounts_payable
    }),
    (Statement::Balance, fields::LONG_TERM_DEBT, |o, k| {
        o.balance_sheets[k].long_term_debt
    }),
    (Statement::Balance, fields::RETAINED_EARNINGS, |o, k| {
        o.balance_sheets[k].retained_earnings
    }),
    (Statement::Balance, fields::TOTAL_ASSETS, |o, k| {
        o.balance_sheets[k].total_assets
    }),
    (Statement::CashFlow, fields::OPERATING_CASH_FLOW, |o, k| {
        let cb = &o.cash_budgets[k];
        cb.operating_cash_flow + cb.interest_income_reclassified
    }),
    (Statement::CashFlow, fields::CAPITAL_EXPENDITURE, |o, k| {
        o.cash_budgets[k].capex
    }),
];

/// Compare forecast years against whatever actuals `history` holds for them.
pub fn compare_with_actuals(
    forecast: &ForecastOutput,
    history: &impl HistoricalSource,
) -> Vec<BacktestEntry> {
    let mut entries = Vec::new();
    for k in 1..forecast.income_statements.len() {
        let Some(fiscal_year) = forecast.fiscal_year(k) else {
            continue;
        };
        for (statement, field, extract) in COMPARED {
            let Some(actual) = history.value(*statement, field, fiscal_year) else {
                continue;
            };
            // Outflows are reported negative on the cash-flow statement
            let actual = if *field == fields::CAPITAL_EXPENDITURE {
                actual.abs()
            } else {
                actual
            };
            let predicted = extract(forecast, k);
            let difference = predicted - actual;
            let pct_difference = if actual.is_zero() {
                None
            } else {
                Some(difference / actual.abs())
            };
            entries.push(BacktestEntry {
                fiscal_year,
                statement: *statement,
                line_item: field.to_string(),
                forecast: predicted,
                actual,
                difference,
                pct_difference,
            });
        }
    }
    entries
}

/// Run the forecast as of `base_year` and score it.
pub fn run_backtest(input: &BacktestInput) -> ForecastResult<ComputationOutput<BacktestOutput>> {
    let start = Instant::now();

    let latest = input.history.base_year().ok_or_else(|| {
        ForecastError::InsufficientHistory("historical dataset is empty".into())
    })?;
    if latest <= input.base_year {
        return Err(ForecastError::InsufficientHistory(format!(
            "no actuals after base year {} to compare against",
            input.base_year
        )));
    }

    let forecast = forecast_from_history(&HistoryForecastInput {
        history: input.history.clone(),
        config: input.config.clone(),
        policy: input.policy.clone(),
        base_year: Some(input.base_year),
    })?;
    let mut warnings = forecast.warnings;
    let output = forecast.result.forecast;

    let entries = compare_with_actuals(&output, &input.history);
    if entries.is_empty() {
        warnings.push("No overlapping line items between forecast and actuals".into());
    }

    let mut years_compared: Vec<i32> = entries.iter().map(|e| e.fiscal_year).collect();
    years_compared.dedup();

    let mut errors: BTreeMap<String, Vec<Rate>> = BTreeMap::new();
    for e in &entries {
        if let Some(pct) = e.pct_difference {
            errors.entry(e.line_item.clone()).or_default().push(pct.abs());
        }
    }
    let mean_abs_pct_error = errors
        .into_iter()
        .map(|(item, errs)| {
            let sum: Decimal = errs.iter().sum();
            (item, sum / Decimal::from(errs.len()))
        })
        .collect();

    info!(
        base_year = input.base_year,
        comparisons = entries.len(),
        "backtest complete"
    );

    let result = BacktestOutput {
        base_year: input.base_year,
        years_compared,
        entries,
        mean_abs_pct_error,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forecast Backtest against Reported Actuals",
        &(&input.config, &input.policy, input.base_year),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
