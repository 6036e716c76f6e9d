use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::DriverConfig;
use crate::error::ForecastError;
use crate::history::{fields, HistoricalSource};
use crate::types::{with_metadata, ComputationOutput, Rate, Statement, Years};
use crate::validation::{validate_horizon, validate_positive, validate_rate, validate_within};
use crate::ForecastResult;

const DAYS_IN_YEAR: Decimal = dec!(365);

/// Spread between the cost of debt and the fallback short-term return.
const ST_RETURN_SPREAD: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Where a driver value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverSource {
    Override,
    Historical,
    YearZero,
    Default,
    Policy,
}

/// Ratios and per-year series that drive a forecast.
///
/// Series are indexed by forecast year minus one. Once built the record is
/// only ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDrivers {
    pub horizon: usize,
    pub revenue_growth: Vec<Rate>,
    pub cost_of_debt: Vec<Rate>,
    pub st_investment_return: Vec<Rate>,
    pub cogs_pct: Rate,
    pub sga_pct: Rate,
    /// AR as % of revenue
    pub ar_pct: Rate,
    /// Inventory as % of COGS
    pub inventory_pct: Rate,
    /// AP as % of COGS
    pub ap_pct: Rate,
    pub capex_pct: Rate,
    pub min_cash_pct: Rate,
    /// Applied to beginning-of-year net PPE
    pub depreciation_rate: Rate,
    pub depreciation_years: Years,
    pub tax_rate: Rate,
    pub payout_ratio: Rate,
    pub pct_financing_with_debt: Rate,
    pub st_loan_years: Years,
    pub lt_loan_years: Years,
    #[serde(default)]
    pub intangibles_amortization_rate: Rate,
    #[serde(default)]
    pub provenance: BTreeMap<String, DriverSource>,
}

impl ForecastDrivers {
    /// Revenue growth for forecast year `year` (1-based).
    pub fn growth(&self, year: usize) -> Rate {
        series_value(&self.revenue_growth, year)
    }

    pub fn cost_of_debt_for(&self, year: usize) -> Rate {
        series_value(&self.cost_of_debt, year)
    }

    pub fn st_return_for(&self, year: usize) -> Rate {
        series_value(&self.st_investment_return, year)
    }

    pub fn dso_days(&self) -> Decimal {
        self.ar_pct * DAYS_IN_YEAR
    }

    pub fn dio_days(&self) -> Decimal {
        self.inventory_pct * DAYS_IN_YEAR
    }

    pub fn dpo_days(&self) -> Decimal {
        self.ap_pct * DAYS_IN_YEAR
    }

    pub fn validate(&self) -> ForecastResult<()> {
        validate_horizon("horizon", self.horizon)?;
        for (name, series) in [
            ("revenue_growth", &self.revenue_growth),
            ("cost_of_debt", &self.cost_of_debt),
            ("st_investment_return", &self.st_investment_return),
        ] {
            if series.len() != self.horizon {
                return Err(ForecastError::InvalidConfiguration {
                    field: name.into(),
                    reason: format!(
                        "Expected {} yearly values, got {}",
                        self.horizon,
                        series.len()
                    ),
                });
            }
        }
        for g in &self.revenue_growth {
            if *g <= dec!(-1) {
                return Err(ForecastError::InvalidConfiguration {
                    field: "revenue_growth".into(),
                    reason: format!("Growth must stay above -100%, got {g}"),
                });
            }
        }
        for r in self.cost_of_debt.iter().chain(self.st_investment_return.iter()) {
            validate_rate("interest_rates", *r)?;
        }

        validate_rate("depreciation_rate", self.depreciation_rate)?;
        validate_rate("tax_rate", self.tax_rate)?;
        validate_rate("payout_ratio", self.payout_ratio)?;
        validate_rate("pct_financing_with_debt", self.pct_financing_with_debt)?;
        validate_rate(
            "intangibles_amortization_rate",
            self.intangibles_amortization_rate,
        )?;
        // Ratios to revenue or COGS may exceed 1 (loss makers, cash-rich firms)
        for (name, value) in [
            ("cogs_pct", self.cogs_pct),
            ("sga_pct", self.sga_pct),
            ("capex_pct", self.capex_pct),
            ("min_cash_pct", self.min_cash_pct),
            ("ar_pct", self.ar_pct),
            ("inventory_pct", self.inventory_pct),
            ("ap_pct", self.ap_pct),
        ] {
            validate_within(name, value, Decimal::ZERO, Decimal::MAX)?;
        }
        validate_positive("st_loan_years", self.st_loan_years)?;
        validate_positive("lt_loan_years", self.lt_loan_years)?;
        Ok(())
    }
}

fn series_value(series: &[Rate], year: usize) -> Rate {
    year.checked_sub(1)
        .and_then(|i| series.get(i))
        .copied()
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Derived drivers plus the working-capital view most readers want.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverReport {
    pub base_year: Option<i32>,
    pub drivers: ForecastDrivers,
    pub dso_days: Decimal,
    pub dio_days: Decimal,
    pub dpo_days: Decimal,
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Derives `ForecastDrivers` from a historical source.
///
/// Each driver resolves in order: override, lookback average, Year-0 ratio,
/// default constant. Data gaps never fail; they are recorded as warnings.
pub struct DriverCalculator<'a, S: HistoricalSource> {
    source: &'a S,
    config: &'a DriverConfig,
    base_year: i32,
    provenance: BTreeMap<String, DriverSource>,
    warnings: Vec<String>,
}

impl<'a, S: HistoricalSource> DriverCalculator<'a, S> {
    pub fn new(source: &'a S, config: &'a DriverConfig) -> ForecastResult<Self> {
        config.validate()?;
        let base_year = source.base_year().ok_or_else(|| {
            ForecastError::InsufficientHistory("historical dataset is empty".into())
        })?;
        Ok(DriverCalculator {
            source,
            config,
            base_year,
            provenance: BTreeMap::new(),
            warnings: Vec::new(),
        })
    }

    pub fn base_year(&self) -> i32 {
        self.base_year
    }

    /// Run every derivation; returns the drivers and the fallback warnings.
    pub fn calculate(mut self) -> ForecastResult<(ForecastDrivers, Vec<String>)> {
        let cfg = self.config;
        let n = cfg.n_input_years;
        let b = &cfg.bounds;
        let d = &cfg.defaults;
        let o = &cfg.overrides;
        let src = self.source;

        let revenue0 = self.year_zero(Statement::Income, fields::TOTAL_REVENUE);
        let cogs0 = self.year_zero(Statement::Income, fields::COST_OF_REVENUE);

        // Revenue growth
        let growth_hist = src
            .growth_rate(Statement::Income, fields::TOTAL_REVENUE, n)
            .map(|g| clip(g, b.min_revenue_growth, b.max_revenue_growth));
        let base_growth = self.resolve(
            "revenue_growth",
            o.revenue_growth,
            growth_hist,
            None,
            d.revenue_growth,
        );
        let revenue_growth = match &o.revenue_growth_path {
            Some(path) if !path.is_empty() => {
                self.provenance
                    .insert("revenue_growth".into(), DriverSource::Override);
                extend_path(path, cfg.n_forecast_years)
            }
            _ => (0..cfg.n_forecast_years)
                .map(|i| base_growth * (Decimal::ONE - cfg.growth_decay * Decimal::from(i)))
                .collect(),
        };

        // Margins
        let cogs_pct = self.resolve(
            "cogs_pct",
            o.cogs_pct,
            src.ratio_average(
                Statement::Income,
                fields::COST_OF_REVENUE,
                fields::TOTAL_REVENUE,
                n,
            ),
            ratio(cogs0, revenue0),
            d.cogs_pct,
        );
        let sga_pct = self.resolve(
            "sga_pct",
            o.sga_pct,
            src.ratio_average(Statement::Income, fields::SGA, fields::TOTAL_REVENUE, n),
            ratio(self.year_zero(Statement::Income, fields::SGA), revenue0),
            d.sga_pct,
        );

        // Working capital
        let ar_pct = self.resolve(
            "ar_pct",
            o.ar_pct,
            positive(src.cross_statement_ratio(
                Statement::Balance,
                fields::ACCOUNTS_RECEIVABLE,
                Statement::Income,
                fields::TOTAL_REVENUE,
                n,
            )),
            positive(ratio(
                self.year_zero(Statement::Balance, fields::ACCOUNTS_RECEIVABLE),
                revenue0,
            )),
            d.ar_pct,
        );
        let inventory_pct = self.resolve(
            "inventory_pct",
            o.inventory_pct,
            positive(src.cross_statement_ratio(
                Statement::Balance,
                fields::INVENTORY,
                Statement::Income,
                fields::COST_OF_REVENUE,
                n,
            )),
            positive(ratio(self.year_zero(Statement::Balance, fields::INVENTORY), cogs0)),
            d.inventory_pct,
        );
        let ap_pct = self.resolve(
            "ap_pct",
            o.ap_pct,
            positive(src.cross_statement_ratio(
                Statement::Balance,
                fields::ACCOUNTS_PAYABLE,
                Statement::Income,
                fields::COST_OF_REVENUE,
                n,
            )),
            positive(ratio(
                self.year_zero(Statement::Balance, fields::ACCOUNTS_PAYABLE),
                cogs0,
            )),
            d.ap_pct,
        );
        let cash0 = self
            .year_zero(Statement::Balance, fields::CASH_AND_EQUIVALENTS)
            .or_else(|| self.year_zero(Statement::Balance, fields::CASH_AND_SHORT_TERM_INVESTMENTS));
        let min_cash_pct = self.resolve(
            "min_cash_pct",
            o.min_cash_pct,
            positive(src.cross_statement_ratio(
                Statement::Balance,
                fields::CASH_AND_EQUIVALENTS,
                Statement::Income,
                fields::TOTAL_REVENUE,
                n,
            )),
            positive(ratio(cash0, revenue0)),
            d.min_cash_pct,
        );

        // Tax
        let within_unit = |t: Decimal| t > Decimal::ZERO && t < Decimal::ONE;
        let tax_rate = self.resolve(
            "tax_rate",
            o.tax_rate,
            src.ratio_average(
                Statement::Income,
                fields::TAX_PROVISION,
                fields::PRETAX_INCOME,
                n,
            )
            .filter(|t| within_unit(*t))
            .map(|t| clip(t, b.min_tax_rate, b.max_tax_rate)),
            ratio(
                self.year_zero(Statement::Income, fields::TAX_PROVISION),
                self.year_zero(Statement::Income, fields::PRETAX_INCOME),
            )
            .filter(|t| within_unit(*t))
            .map(|t| clip(t, b.min_tax_rate, b.max_tax_rate)),
            d.tax_rate,
        );

        // Depreciation
        let dep0 = self
            .year_zero(Statement::Income, fields::RECONCILED_DEPRECIATION)
            .or_else(|| self.year_zero(Statement::CashFlow, fields::DEPRECIATION_AND_AMORTIZATION))
            .map(|v| v.abs());
        let depreciation_years = self.resolve(
            "depreciation_years",
            None,
            positive(src.cross_statement_ratio(
                Statement::Balance,
                fields::GROSS_PPE,
                Statement::Income,
                fields::RECONCILED_DEPRECIATION,
                n,
            ))
            .map(|y| clip(y, b.min_depreciation_years, b.max_depreciation_years)),
            positive(ratio(self.year_zero(Statement::Balance, fields::GROSS_PPE), dep0))
                .map(|y| clip(y, b.min_depreciation_years, b.max_depreciation_years)),
            d.depreciation_years,
        );
        let net_ppe0 = self.year_zero(Statement::Balance, fields::NET_PPE);
        let depreciation_rate = self.resolve(
            "depreciation_rate",
            o.depreciation_rate,
            None,
            positive(ratio(dep0, net_ppe0)).filter(|r| *r <= Decimal::ONE),
            Decimal::ONE / depreciation_years,
        );

        // Financing costs
        let cost_of_debt = self.resolve(
            "cost_of_debt",
            o.cost_of_debt,
            positive(
                src.cross_statement_ratio(
                    Statement::Income,
                    fields::INTEREST_EXPENSE,
                    Statement::Balance,
                    fields::TOTAL_DEBT,
                    n,
                )
                .map(|r| r.abs()),
            )
            .map(|r| clip(r, b.min_cost_of_debt, b.max_cost_of_debt)),
            None,
            d.cost_of_debt,
        );
        let interest_income_ratio = src
            .cross_statement_ratio(
                Statement::Income,
                fields::INTEREST_INCOME,
                Statement::Balance,
                fields::CASH_AND_EQUIVALENTS,
                n,
            )
            .or_else(|| {
                src.cross_statement_ratio(
                    Statement::Income,
                    fields::INTEREST_INCOME_NON_OPERATING,
                    Statement::Balance,
                    fields::CASH_AND_EQUIVALENTS,
                    n,
                )
            });
        let st_return = self.resolve(
            "st_investment_return",
            o.st_investment_return,
            positive(interest_income_ratio).map(|r| clip(r, b.min_st_return, b.max_st_return)),
            None,
            b.min_st_return.max(cost_of_debt - ST_RETURN_SPREAD),
        );

        // Owners
        let payout_ratio = self.resolve(
            "payout_ratio",
            o.payout_ratio,
            src.cross_statement_ratio(
                Statement::CashFlow,
                fields::CASH_DIVIDENDS_PAID,
                Statement::Income,
                fields::NET_INCOME,
                n,
            )
            .map(|r| clip(r.abs(), Decimal::ZERO, Decimal::ONE)),
            ratio(
                self.year_zero(Statement::CashFlow, fields::CASH_DIVIDENDS_PAID)
                    .map(|v| v.abs()),
                self.year_zero(Statement::Income, fields::NET_INCOME)
                    .filter(|ni| *ni > Decimal::ZERO),
            )
            .map(|r| clip(r, Decimal::ZERO, Decimal::ONE)),
            d.payout_ratio,
        );

        // Investment
        let capex_pct = self.resolve(
            "capex_pct",
            o.capex_pct,
            src.cross_statement_ratio(
                Statement::CashFlow,
                fields::CAPITAL_EXPENDITURE,
                Statement::Income,
                fields::TOTAL_REVENUE,
                n,
            )
            .map(|r| r.abs()),
            ratio(
                self.year_zero(Statement::CashFlow, fields::CAPITAL_EXPENDITURE)
                    .map(|v| v.abs()),
                revenue0,
            ),
            d.capex_pct,
        );

        for name in [
            "pct_financing_with_debt",
            "st_loan_years",
            "lt_loan_years",
            "intangibles_amortization_rate",
        ] {
            self.provenance.insert(name.into(), DriverSource::Policy);
        }

        let horizon = cfg.n_forecast_years;
        let drivers = ForecastDrivers {
            horizon,
            revenue_growth,
            cost_of_debt: vec![cost_of_debt; horizon],
            st_investment_return: vec![st_return; horizon],
            cogs_pct,
            sga_pct,
            ar_pct,
            inventory_pct,
            ap_pct,
            capex_pct,
            min_cash_pct,
            depreciation_rate,
            depreciation_years,
            tax_rate,
            payout_ratio,
            pct_financing_with_debt: cfg.pct_financing_with_debt,
            st_loan_years: cfg.st_loan_years,
            lt_loan_years: cfg.lt_loan_years,
            intangibles_amortization_rate: cfg.intangibles_amortization_rate,
            provenance: self.provenance,
        };
        drivers.validate()?;

        debug!(
            base_year = self.base_year,
            growth = %base_growth,
            cogs_pct = %drivers.cogs_pct,
            tax_rate = %drivers.tax_rate,
            "drivers derived"
        );
        Ok((drivers, self.warnings))
    }

    fn year_zero(&self, statement: Statement, field: &str) -> Option<Decimal> {
        self.source.value(statement, field, self.base_year)
    }

    fn resolve(
        &mut self,
        name: &str,
        override_value: Option<Decimal>,
        historical: Option<Decimal>,
        year_zero: Option<Decimal>,
        default: Decimal,
    ) -> Decimal {
        let (value, source) = if let Some(v) = override_value {
            (v, DriverSource::Override)
        } else if let Some(v) = historical {
            (v, DriverSource::Historical)
        } else if let Some(v) = year_zero {
            (v, DriverSource::YearZero)
        } else {
            warn!(driver = name, value = %default, "no historical observation, using default");
            self.warnings
                .push(format!("{name}: no historical observation, default {default} used"));
            (default, DriverSource::Default)
        };
        self.provenance.insert(name.to_string(), source);
        value
    }
}

/// Derive drivers from history and wrap them in the standard envelope.
pub fn derive_drivers(
    source: &impl HistoricalSource,
    config: &DriverConfig,
) -> ForecastResult<ComputationOutput<DriverReport>> {
    let start = Instant::now();
    let calculator = DriverCalculator::new(source, config)?;
    let base_year = calculator.base_year();
    let (drivers, warnings) = calculator.calculate()?;

    let report = DriverReport {
        base_year: Some(base_year),
        dso_days: drivers.dso_days(),
        dio_days: drivers.dio_days(),
        dpo_days: drivers.dpo_days(),
        drivers,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical Driver Derivation (lookback average, clipped, with fallbacks)",
        config,
        warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn clip(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.max(min).min(max)
}

fn ratio(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    let den = denominator?;
    if den.is_zero() {
        return None;
    }
    Some(numerator? / den)
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

/// Pad a growth path with its last value, or truncate it, to `horizon` years.
fn extend_path(path: &[Rate], horizon: usize) -> Vec<Rate> {
    let last = path.last().copied().unwrap_or(Decimal::ZERO);
    (0..horizon)
        .map(|i| path.get(i).copied().unwrap_or(last))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StatementHistory;

    fn three_year_history() -> StatementHistory {
        let mut h = StatementHistory::new();
        for (year, revenue) in [(2021, dec!(1000)), (2022, dec!(1100)), (2023, dec!(1210))] {
            h = h
                .with(Statement::Income, fields::TOTAL_REVENUE, year, revenue)
                .with(Statement::Income, fields::COST_OF_REVENUE, year, revenue * dec!(0.55))
                .with(Statement::Income, fields::SGA, year, revenue * dec!(0.15))
                .with(Statement::Income, fields::PRETAX_INCOME, year, dec!(200))
                .with(Statement::Income, fields::TAX_PROVISION, year, dec!(50))
                .with(Statement::Income, fields::NET_INCOME, year, dec!(150))
                .with(Statement::Income, fields::INTEREST_EXPENSE, year, dec!(30))
                .with(Statement::Income, fields::RECONCILED_DEPRECIATION, year, dec!(40))
                .with(Statement::Balance, fields::ACCOUNTS_RECEIVABLE, year, revenue * dec!(0.1))
                .with(Statement::Balance, fields::TOTAL_DEBT, year, dec!(500))
                .with(Statement::Balance, fields::NET_PPE, year, dec!(400))
                .with(Statement::Balance, fields::GROSS_PPE, year, dec!(600))
                .with(Statement::CashFlow, fields::CASH_DIVIDENDS_PAID, year, dec!(-60))
                .with(Statement::CashFlow, fields::CAPITAL_EXPENDITURE, year, revenue * dec!(-0.05));
        }
        h
    }

    fn derive(h: &StatementHistory, config: &DriverConfig) -> (ForecastDrivers, Vec<String>) {
        DriverCalculator::new(h, config).unwrap().calculate().unwrap()
    }

    #[test]
    fn test_historical_ratios() {
        let (d, _) = derive(&three_year_history(), &DriverConfig::default());
        assert_eq!(d.cogs_pct, dec!(0.55));
        assert_eq!(d.sga_pct, dec!(0.15));
        assert_eq!(d.ar_pct, dec!(0.1));
        assert_eq!(d.tax_rate, dec!(0.25));
        assert_eq!(d.payout_ratio, dec!(0.4));
        assert_eq!(d.capex_pct, dec!(0.05));
        // 30 / 500 = 6%
        assert_eq!(d.cost_of_debt[0], dec!(0.06));
        // 40 / 400
        assert_eq!(d.depreciation_rate, dec!(0.1));
        // 600 / 40 = 15 years
        assert_eq!(d.depreciation_years, dec!(15));
        assert_eq!(d.provenance["cogs_pct"], DriverSource::Historical);
    }

    #[test]
    fn test_growth_decays_linearly() {
        let (d, _) = derive(&three_year_history(), &DriverConfig::default());
        assert_eq!(d.revenue_growth.len(), 5);
        assert_eq!(d.revenue_growth[0], dec!(0.1));
        // 0.10 * (1 - 0.05 * 2)
        assert_eq!(d.revenue_growth[2], dec!(0.09));
        assert_eq!(d.growth(1), dec!(0.1));
    }

    #[test]
    fn test_growth_clipped_to_bounds() {
        let h = StatementHistory::new()
            .with(Statement::Income, fields::TOTAL_REVENUE, 2022, dec!(100))
            .with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(200));
        let (d, _) = derive(&h, &DriverConfig::default());
        assert_eq!(d.revenue_growth[0], dec!(0.15));
    }

    #[test]
    fn test_override_wins() {
        let mut config = DriverConfig::default();
        config.overrides.cogs_pct = Some(dec!(0.7));
        config.overrides.revenue_growth = Some(dec!(0.2));
        let (d, _) = derive(&three_year_history(), &config);
        assert_eq!(d.cogs_pct, dec!(0.7));
        // Overrides are not clipped
        assert_eq!(d.revenue_growth[0], dec!(0.2));
        assert_eq!(d.provenance["cogs_pct"], DriverSource::Override);
    }

    #[test]
    fn test_growth_path_override_padded() {
        let mut config = DriverConfig::default();
        config.overrides.revenue_growth_path = Some(vec![dec!(0.08), dec!(0.06)]);
        let (d, _) = derive(&three_year_history(), &config);
        assert_eq!(
            d.revenue_growth,
            vec![dec!(0.08), dec!(0.06), dec!(0.06), dec!(0.06), dec!(0.06)]
        );
    }

    #[test]
    fn test_sparse_history_falls_back_to_defaults() {
        let h = StatementHistory::new().with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(500));
        let (d, warnings) = derive(&h, &DriverConfig::default());
        assert_eq!(d.revenue_growth[0], dec!(0.03));
        assert_eq!(d.cogs_pct, dec!(0.60));
        assert_eq!(d.tax_rate, dec!(0.21));
        assert_eq!(d.cost_of_debt[0], dec!(0.05));
        // max(1%, 5% - 1%)
        assert_eq!(d.st_investment_return[0], dec!(0.04));
        // 1 / 10 years
        assert_eq!(d.depreciation_rate, dec!(0.1));
        assert!(warnings.iter().any(|w| w.starts_with("cogs_pct")));
        assert_eq!(d.provenance["tax_rate"], DriverSource::Default);
    }

    #[test]
    fn test_empty_history_rejected() {
        let h = StatementHistory::new();
        let err = DriverCalculator::new(&h, &DriverConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ForecastError::InsufficientHistory(_)));
    }

    #[test]
    fn test_tax_rate_outside_unit_interval_ignored() {
        let h = StatementHistory::new()
            .with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(500))
            .with(Statement::Income, fields::PRETAX_INCOME, 2023, dec!(-100))
            .with(Statement::Income, fields::TAX_PROVISION, 2023, dec!(10));
        let (d, _) = derive(&h, &DriverConfig::default());
        assert_eq!(d.tax_rate, dec!(0.21));
    }

    #[test]
    fn test_working_capital_days() {
        let (d, _) = derive(&three_year_history(), &DriverConfig::default());
        assert_eq!(d.dso_days(), dec!(36.5));
    }

    #[test]
    fn test_derive_drivers_envelope() {
        let out = derive_drivers(&three_year_history(), &DriverConfig::default()).unwrap();
        assert_eq!(out.result.base_year, Some(2023));
        assert!(out.methodology.contains("Driver Derivation"));
    }

    #[test]
    fn test_ratios_above_one_accepted() {
        let mut h = StatementHistory::new();
        for (year, revenue) in [(2021, dec!(1000)), (2022, dec!(1100)), (2023, dec!(1210))] {
            h = h
                .with(Statement::Income, fields::TOTAL_REVENUE, year, revenue)
                .with(Statement::Income, fields::COST_OF_REVENUE, year, revenue * dec!(1.1))
                .with(Statement::Balance, fields::CASH_AND_EQUIVALENTS, year, dec!(3000));
        }
        let (d, _) = derive(&h, &DriverConfig::default());
        assert_eq!(d.cogs_pct, dec!(1.1));
        assert!(d.min_cash_pct > Decimal::ONE);
        assert_eq!(d.provenance["min_cash_pct"], DriverSource::Historical);
    }

    #[test]
    fn test_validate_rejects_negative_ratio() {
        let (mut d, _) = derive(&three_year_history(), &DriverConfig::default());
        d.sga_pct = dec!(-0.1);
        assert!(matches!(
            d.validate().unwrap_err(),
            ForecastError::InvalidConfiguration { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_short_series() {
        let (mut d, _) = derive(&three_year_history(), &DriverConfig::default());
        d.cost_of_debt.pop();
        assert!(matches!(
            d.validate().unwrap_err(),
            ForecastError::InvalidConfiguration { .. }
        ));
    }
}
