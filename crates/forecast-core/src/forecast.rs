use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::arena::YearSlots;
use crate::config::{DriverConfig, ForecastPolicy};
use crate::debt::{DebtLedger, DebtLedgerYear, DebtVintage};
use crate::drivers::{DriverCalculator, DriverReport, ForecastDrivers};
use crate::error::ForecastError;
use crate::fundamentals::YearZeroFundamentals;
use crate::history::StatementHistory;
use crate::projection::{IntermediateProjector, ProjectedYear};
use crate::statements::balance_sheet::{BalanceSheetCompiler, BalanceSheetYear, YearInputs};
use crate::statements::cash_budget::{CashBudgetEngine, CashBudgetYear};
use crate::statements::income::{IncomeStatementEngine, IncomeStatementYear};
use crate::statements::OpeningBalances;
use crate::types::{safe_divide, with_metadata, ComputationOutput, Money, Rate};
use crate::ForecastResult;

const LEVERAGE_WARNING: Decimal = dec!(6);
const COVERAGE_WARNING: Decimal = dec!(2);

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A forecast from an already-prepared Year-0 record and driver set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    pub fundamentals: YearZeroFundamentals,
    pub drivers: ForecastDrivers,
    #[serde(default)]
    pub policy: ForecastPolicy,
}

/// A forecast straight from historical statements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryForecastInput {
    pub history: StatementHistory,
    #[serde(default)]
    pub config: DriverConfig,
    #[serde(default)]
    pub policy: ForecastPolicy,
    /// Ignore any period after this fiscal year
    #[serde(default)]
    pub base_year: Option<i32>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Every per-year record, Year 0 first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub base_year: Option<i32>,
    pub projections: Vec<ProjectedYear>,
    pub income_statements: Vec<IncomeStatementYear>,
    pub cash_budgets: Vec<CashBudgetYear>,
    pub debt_schedule: Vec<DebtLedgerYear>,
    pub vintages: Vec<DebtVintage>,
    pub balance_sheets: Vec<BalanceSheetYear>,
    pub balance_check: Vec<Money>,
    pub summary: ForecastSummary,
}

impl ForecastOutput {
    /// Fiscal year of forecast year `year`, when the base year is known.
    pub fn fiscal_year(&self, year: usize) -> Option<i32> {
        let offset = i32::try_from(year).ok()?;
        self.base_year.map(|b| b + offset)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub total_years: usize,
    pub revenue_cagr: Rate,
    pub avg_gross_margin: Rate,
    pub avg_operating_margin: Rate,
    pub avg_net_margin: Rate,
    pub ending_total_debt: Money,
    /// Ending debt over final-year EBITDA
    pub ending_leverage: Decimal,
    pub cumulative_free_cash_flow: Money,
    /// Mean capex over depreciation; above 1 means the asset base grows
    pub avg_capex_to_depreciation: Decimal,
    pub total_new_debt: Money,
    pub total_new_equity: Money,
    pub total_dividends_paid: Money,
    pub max_abs_balance_check: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryForecastOutput {
    pub drivers: DriverReport,
    pub fundamentals: YearZeroFundamentals,
    pub forecast: ForecastOutput,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs Year 0 and then every forecast year in the fixed order: income
/// statement, cash budget, debt ledger, balance sheet.
pub struct Forecaster<'a> {
    fundamentals: &'a YearZeroFundamentals,
    drivers: &'a ForecastDrivers,
    policy: &'a ForecastPolicy,
}

impl<'a> Forecaster<'a> {
    pub fn new(
        fundamentals: &'a YearZeroFundamentals,
        drivers: &'a ForecastDrivers,
        policy: &'a ForecastPolicy,
    ) -> ForecastResult<Self> {
        fundamentals.validate()?;
        drivers.validate()?;
        policy.validate()?;
        Ok(Forecaster {
            fundamentals,
            drivers,
            policy,
        })
    }

    /// Produce the forecast and any business warnings.
    ///
    /// Fails with `Imbalance` if any year's closure check drifts from the
    /// Year-0 value by more than the policy tolerance.
    pub fn run(&self) -> ForecastResult<(ForecastOutput, Vec<String>)> {
        let f = self.fundamentals;
        let d = self.drivers;
        let policy = self.policy;
        let horizon = d.horizon;
        let tolerance = policy.closure_tolerance;
        let mut warnings: Vec<String> = Vec::new();

        let projections = IntermediateProjector::new(f, d).project()?;
        let income_engine = IncomeStatementEngine::new(d, policy);
        let budget_engine = CashBudgetEngine::new(d, policy);
        let compiler = BalanceSheetCompiler::new(f);

        let mut ledger = DebtLedger::new(horizon, d.lt_loan_years)?;
        ledger.initialize(
            f.short_term_debt,
            f.long_term_debt,
            d.lt_loan_years * policy.legacy_debt_remaining_share,
        )?;

        let mut incomes = YearSlots::new("income_statement", horizon);
        let mut budgets = YearSlots::new("cash_budget", horizon);
        let mut balances = YearSlots::new("balance_sheet", horizon);
        incomes.finalize(0, IncomeStatementEngine::seed(f))?;
        budgets.finalize(0, CashBudgetEngine::seed(f))?;
        let seed = compiler.seed();
        let seed_check = seed.balance_check;
        balances.finalize(0, seed)?;

        if seed_check.abs() > tolerance {
            warn!(%seed_check, "Year-0 balance sheet does not reconcile");
            warnings.push(format!(
                "Year 0: reported balance sheet does not reconcile (difference {seed_check}); \
                 the same difference is carried through every forecast year"
            ));
        }

        for year in 1..=horizon {
            let prior = year - 1;
            let projected = projections.read_for(year, year)?;
            let prior_budget = budgets.read_for(year, prior)?;
            let opening = OpeningBalances {
                cash: prior_budget.cumulated_cash,
                st_investment: prior_budget.new_st_investment,
                st_debt: ledger.st_ending(prior)?,
                lt_debt: ledger.lt_ending(prior)?,
            };

            let income =
                income_engine.compute_year(projected, &opening, incomes.read_for(year, prior)?);

            let lt_due = ledger.total_principal_due(year);
            let budget =
                budget_engine.compute_year(projected, &income, &opening, lt_due, prior_budget);

            ledger.roll_short_term(year, budget.new_st_loan, budget.st_principal_due)?;
            ledger.roll_long_term(year, budget.new_lt_loan)?;
            let debt = ledger.year_record(year)?;

            let balance = compiler.compile(
                &YearInputs {
                    projected,
                    income: &income,
                    budget: &budget,
                    debt: &debt,
                },
                balances.read_for(year, prior)?,
            );

            check_closure(year, balance.balance_check, seed_check, tolerance)?;

            debug!(
                year,
                revenue = %income.revenue,
                net_income = %income.net_income,
                cash = %balance.cash,
                financing_need = %budget.financing_need,
                total_debt = %debt.total_debt,
                "year closed"
            );
            push_year_warnings(&mut warnings, &income, &budget, &debt);

            incomes.finalize(year, income)?;
            budgets.finalize(year, budget)?;
            balances.finalize(year, balance)?;
        }

        let projections = projections.into_vec()?;
        let income_statements = incomes.into_vec()?;
        let cash_budgets = budgets.into_vec()?;
        let balance_sheets = balances.into_vec()?;
        let (debt_schedule, vintages) = ledger.into_schedule()?;
        let balance_check = balance_sheets.iter().map(|b| b.balance_check).collect();

        let summary = build_summary(
            &income_statements,
            &cash_budgets,
            &balance_sheets,
            seed_check,
        );

        info!(
            horizon,
            revenue_cagr = %summary.revenue_cagr,
            ending_debt = %summary.ending_total_debt,
            "forecast complete"
        );

        Ok((
            ForecastOutput {
                base_year: f.base_year,
                projections,
                income_statements,
                cash_budgets,
                debt_schedule,
                vintages,
                balance_sheets,
                balance_check,
                summary,
            },
            warnings,
        ))
    }
}

/// Forecast from prepared fundamentals and drivers.
pub fn build_forecast(input: &ForecastInput) -> ForecastResult<ComputationOutput<ForecastOutput>> {
    let start = Instant::now();
    let (output, warnings) =
        Forecaster::new(&input.fundamentals, &input.drivers, &input.policy)?.run()?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "No-Plug Three-Statement Forecast (lagged interest, five-module cash budget)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Derive drivers and the Year-0 record from history, then forecast.
pub fn forecast_from_history(
    input: &HistoryForecastInput,
) -> ForecastResult<ComputationOutput<HistoryForecastOutput>> {
    let start = Instant::now();
    let history = match input.base_year {
        Some(year) => input.history.with_base_year(year),
        None => input.history.clone(),
    };

    let calculator = DriverCalculator::new(&history, &input.config)?;
    let base_year = calculator.base_year();
    let (drivers, mut warnings) = calculator.calculate()?;
    let fundamentals = YearZeroFundamentals::from_history_at(&history, base_year)?;

    let (forecast, forecast_warnings) =
        Forecaster::new(&fundamentals, &drivers, &input.policy)?.run()?;
    warnings.extend(forecast_warnings);

    let output = HistoryForecastOutput {
        drivers: DriverReport {
            base_year: Some(base_year),
            dso_days: drivers.dso_days(),
            dio_days: drivers.dio_days(),
            dpo_days: drivers.dpo_days(),
            drivers,
        },
        fundamentals,
        forecast,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "No-Plug Three-Statement Forecast from Historical Statements",
        &(&input.config, &input.policy, input.base_year),
        warnings,
        elapsed,
        output,
    ))
}

/// Check every balance sheet's closure against an absolute tolerance.
pub fn verify_closure(balance_sheets: &[BalanceSheetYear], tolerance: Money) -> ForecastResult<()> {
    for bs in balance_sheets {
        check_closure(bs.year, bs.balance_check, Decimal::ZERO, tolerance)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `Imbalance` carries the drift of `check` from `reference`, the quantity
/// compared against `tolerance`.
fn check_closure(year: usize, check: Money, reference: Money, tolerance: Money) -> ForecastResult<()> {
    let drift = check - reference;
    if drift.abs() > tolerance {
        return Err(ForecastError::Imbalance {
            year,
            difference: drift,
            tolerance,
        });
    }
    Ok(())
}

fn push_year_warnings(
    warnings: &mut Vec<String>,
    income: &IncomeStatementYear,
    budget: &CashBudgetYear,
    debt: &DebtLedgerYear,
) {
    let year = income.year;
    let ebitda = income.ebitda();
    if ebitda > Decimal::ZERO {
        let leverage = debt.total_debt / ebitda;
        if leverage > LEVERAGE_WARNING {
            warnings.push(format!(
                "Year {year}: leverage ratio {leverage:.1}x exceeds 6.0x threshold"
            ));
        }
    }
    if income.interest_expense > Decimal::ZERO {
        let coverage = income.operating_income / income.interest_expense;
        if coverage < COVERAGE_WARNING {
            warnings.push(format!(
                "Year {year}: interest coverage ratio {coverage:.2}x below 2.0x minimum"
            ));
        }
    }
    let fcf = budget.free_cash_flow();
    if fcf < Decimal::ZERO {
        warnings.push(format!("Year {year}: negative free cash flow ({fcf})"));
    }
    if budget.new_equity > Decimal::ZERO {
        warnings.push(format!(
            "Year {year}: {} of new equity needed to hold the minimum cash balance",
            budget.new_equity.round_dp(2)
        ));
    }
}

fn build_summary(
    income_statements: &[IncomeStatementYear],
    cash_budgets: &[CashBudgetYear],
    balance_sheets: &[BalanceSheetYear],
    seed_check: Money,
) -> ForecastSummary {
    let forecast_is = income_statements.get(1..).unwrap_or(&[]);
    let forecast_cb = cash_budgets.get(1..).unwrap_or(&[]);
    let forecast_bs = balance_sheets.get(1..).unwrap_or(&[]);
    let n = forecast_is.len();

    let first_revenue = income_statements
        .first()
        .map(|is| is.revenue)
        .unwrap_or(Decimal::ZERO);
    let last_is = forecast_is.last();
    let last_revenue = last_is.map(|is| is.revenue).unwrap_or(Decimal::ZERO);

    let ending_total_debt = forecast_bs
        .last()
        .map(|bs| bs.total_debt())
        .unwrap_or(Decimal::ZERO);
    let ending_leverage = last_is
        .map(|is| is.ebitda())
        .filter(|e| *e > Decimal::ZERO)
        .map(|e| ending_total_debt / e)
        .unwrap_or(Decimal::ZERO);

    ForecastSummary {
        total_years: n,
        revenue_cagr: compute_cagr(first_revenue, last_revenue, n),
        avg_gross_margin: average(forecast_is, |is| safe_divide(is.gross_profit, is.revenue)),
        avg_operating_margin: average(forecast_is, |is| {
            safe_divide(is.operating_income, is.revenue)
        }),
        avg_net_margin: average(forecast_is, |is| safe_divide(is.net_income, is.revenue)),
        ending_total_debt,
        ending_leverage,
        cumulative_free_cash_flow: forecast_cb.iter().map(|cb| cb.free_cash_flow()).sum(),
        avg_capex_to_depreciation: average(forecast_cb, |cb| {
            safe_divide(cb.capex, cb.depreciation)
        }),
        total_new_debt: forecast_cb
            .iter()
            .map(|cb| cb.new_st_loan + cb.new_lt_loan)
            .sum(),
        total_new_equity: forecast_cb.iter().map(|cb| cb.new_equity).sum(),
        total_dividends_paid: forecast_cb.iter().map(|cb| cb.dividends_paid).sum(),
        max_abs_balance_check: forecast_bs
            .iter()
            .map(|bs| (bs.balance_check - seed_check).abs())
            .max()
            .unwrap_or(Decimal::ZERO),
    }
}

fn average<T>(years: &[T], f: impl Fn(&T) -> Decimal) -> Decimal {
    if years.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = years.iter().map(f).sum();
    sum / Decimal::from(years.len())
}

/// (ending / beginning)^(1/n) - 1
fn compute_cagr(beginning: Money, ending: Money, n: usize) -> Rate {
    if beginning <= Decimal::ZERO || ending <= Decimal::ZERO || n == 0 {
        return Decimal::ZERO;
    }
    let ratio = ending / beginning;
    ratio
        .checked_powd(Decimal::ONE / Decimal::from(n))
        .map(|root| root - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
