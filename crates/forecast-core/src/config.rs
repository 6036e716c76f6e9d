use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::types::{Money, Rate, Years};
use crate::validation::{validate_horizon, validate_non_negative, validate_positive, validate_rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Driver derivation settings
// ---------------------------------------------------------------------------

/// How drivers are derived from history, and what to use when history is
/// silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Historical years averaged for each ratio
    pub n_input_years: usize,
    /// Years to project
    pub n_forecast_years: usize,
    /// Linear damping applied to revenue growth per forecast year
    pub growth_decay: Rate,
    /// Share of external financing raised as long-term debt (rest is equity)
    pub pct_financing_with_debt: Rate,
    /// Term of short-term loans, in years
    pub st_loan_years: Years,
    /// Term of long-term loans, in years
    pub lt_loan_years: Years,
    /// Annual amortisation of Year-0 intangibles (0 holds them constant)
    pub intangibles_amortization_rate: Rate,
    pub bounds: DriverBounds,
    pub defaults: DriverDefaults,
    pub overrides: DriverOverrides,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            n_input_years: 3,
            n_forecast_years: 5,
            growth_decay: dec!(0.05),
            pct_financing_with_debt: dec!(0.70),
            st_loan_years: dec!(1),
            lt_loan_years: dec!(10),
            intangibles_amortization_rate: Decimal::ZERO,
            bounds: DriverBounds::default(),
            defaults: DriverDefaults::default(),
            overrides: DriverOverrides::default(),
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> ForecastResult<()> {
        validate_horizon("n_forecast_years", self.n_forecast_years)?;
        if self.n_input_years == 0 {
            return Err(ForecastError::InvalidConfiguration {
                field: "n_input_years".into(),
                reason: "Lookback window must cover at least one year".into(),
            });
        }
        validate_rate("growth_decay", self.growth_decay)?;
        validate_rate("pct_financing_with_debt", self.pct_financing_with_debt)?;
        validate_rate(
            "intangibles_amortization_rate",
            self.intangibles_amortization_rate,
        )?;
        validate_positive("st_loan_years", self.st_loan_years)?;
        validate_positive("lt_loan_years", self.lt_loan_years)?;
        self.bounds.validate()
    }
}

/// Clipping range for each derived driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverBounds {
    pub min_revenue_growth: Rate,
    pub max_revenue_growth: Rate,
    pub min_tax_rate: Rate,
    pub max_tax_rate: Rate,
    pub min_depreciation_years: Years,
    pub max_depreciation_years: Years,
    pub min_cost_of_debt: Rate,
    pub max_cost_of_debt: Rate,
    pub min_st_return: Rate,
    pub max_st_return: Rate,
}

impl Default for DriverBounds {
    fn default() -> Self {
        DriverBounds {
            min_revenue_growth: dec!(-0.10),
            max_revenue_growth: dec!(0.15),
            min_tax_rate: dec!(0.10),
            max_tax_rate: dec!(0.40),
            min_depreciation_years: dec!(5),
            max_depreciation_years: dec!(25),
            min_cost_of_debt: dec!(0.03),
            max_cost_of_debt: dec!(0.15),
            min_st_return: dec!(0.01),
            max_st_return: dec!(0.08),
        }
    }
}

impl DriverBounds {
    fn validate(&self) -> ForecastResult<()> {
        let pairs = [
            ("revenue_growth", self.min_revenue_growth, self.max_revenue_growth),
            ("tax_rate", self.min_tax_rate, self.max_tax_rate),
            (
                "depreciation_years",
                self.min_depreciation_years,
                self.max_depreciation_years,
            ),
            ("cost_of_debt", self.min_cost_of_debt, self.max_cost_of_debt),
            ("st_return", self.min_st_return, self.max_st_return),
        ];
        for (name, min, max) in pairs {
            if min > max {
                return Err(ForecastError::InvalidConfiguration {
                    field: format!("bounds.{name}"),
                    reason: format!("Lower bound {min} exceeds upper bound {max}"),
                });
            }
        }
        if self.min_revenue_growth <= dec!(-1) {
            return Err(ForecastError::InvalidConfiguration {
                field: "bounds.min_revenue_growth".into(),
                reason: "Growth must stay above -100%".into(),
            });
        }
        validate_positive("bounds.min_depreciation_years", self.min_depreciation_years)?;
        validate_rate("bounds.max_tax_rate", self.max_tax_rate)
    }
}

/// Fallback constants used when no historical observation exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverDefaults {
    pub revenue_growth: Rate,
    pub cogs_pct: Rate,
    pub sga_pct: Rate,
    pub ar_pct: Rate,
    pub inventory_pct: Rate,
    pub ap_pct: Rate,
    pub min_cash_pct: Rate,
    pub tax_rate: Rate,
    pub depreciation_years: Years,
    pub cost_of_debt: Rate,
    pub payout_ratio: Rate,
    pub capex_pct: Rate,
}

impl Default for DriverDefaults {
    fn default() -> Self {
        DriverDefaults {
            revenue_growth: dec!(0.03),
            cogs_pct: dec!(0.60),
            sga_pct: dec!(0.20),
            ar_pct: dec!(0.08),
            inventory_pct: dec!(0.05),
            ap_pct: dec!(0.10),
            min_cash_pct: dec!(0.04),
            tax_rate: dec!(0.21),
            depreciation_years: dec!(10),
            cost_of_debt: dec!(0.05),
            payout_ratio: dec!(0.5),
            capex_pct: dec!(0.04),
        }
    }
}

/// Company-specific values that replace anything derived from history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOverrides {
    pub revenue_growth: Option<Rate>,
    /// Full per-year growth path; wins over `revenue_growth` and decay
    pub revenue_growth_path: Option<Vec<Rate>>,
    pub cogs_pct: Option<Rate>,
    pub sga_pct: Option<Rate>,
    pub ar_pct: Option<Rate>,
    pub inventory_pct: Option<Rate>,
    pub ap_pct: Option<Rate>,
    pub min_cash_pct: Option<Rate>,
    pub tax_rate: Option<Rate>,
    pub depreciation_rate: Option<Rate>,
    pub cost_of_debt: Option<Rate>,
    pub st_investment_return: Option<Rate>,
    pub payout_ratio: Option<Rate>,
    pub capex_pct: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Financing policy
// ---------------------------------------------------------------------------

/// When declared dividends leave the company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendTiming {
    /// Paid in the year they are declared
    #[default]
    SameYear,
    /// Paid the year after declaration; year 1 pays the Year-0 dividend
    FollowingYear,
}

/// Financing and cash-management constants applied every forecast year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastPolicy {
    /// Share of a financing need raised as short-term debt
    pub st_financing_share: Rate,
    /// Share of cash above the floor invested in short-term instruments
    pub sweep_fraction: Rate,
    /// Repurchase each year as a share of the prior year's repurchase
    pub repurchase_fraction: Rate,
    /// Share of the loan term still to run on Year-0 long-term debt
    pub legacy_debt_remaining_share: Rate,
    pub dividend_timing: DividendTiming,
    /// Largest drift of the closure check from its Year-0 value
    pub closure_tolerance: Money,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        ForecastPolicy {
            st_financing_share: dec!(0.30),
            sweep_fraction: dec!(0.50),
            repurchase_fraction: dec!(0.30),
            legacy_debt_remaining_share: dec!(0.70),
            dividend_timing: DividendTiming::SameYear,
            closure_tolerance: dec!(0.000001),
        }
    }
}

impl ForecastPolicy {
    pub fn validate(&self) -> ForecastResult<()> {
        validate_rate("st_financing_share", self.st_financing_share)?;
        validate_rate("sweep_fraction", self.sweep_fraction)?;
        validate_rate("repurchase_fraction", self.repurchase_fraction)?;
        validate_rate(
            "legacy_debt_remaining_share",
            self.legacy_debt_remaining_share,
        )?;
        validate_positive(
            "legacy_debt_remaining_share",
            self.legacy_debt_remaining_share,
        )?;
        validate_non_negative("closure_tolerance", self.closure_tolerance)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
