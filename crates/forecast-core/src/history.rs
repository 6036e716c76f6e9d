use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ForecastError;
use crate::types::{Rate, Statement};
use crate::ForecastResult;

/// Line-item names as they appear in the historical statements.
pub mod fields {
    // Income statement
    pub const TOTAL_REVENUE: &str = "Total Revenue";
    pub const COST_OF_REVENUE: &str = "Cost Of Revenue";
    pub const GROSS_PROFIT: &str = "Gross Profit";
    pub const SGA: &str = "Selling General And Administration";
    pub const OPERATING_INCOME: &str = "Operating Income";
    pub const INTEREST_EXPENSE: &str = "Interest Expense";
    pub const INTEREST_INCOME: &str = "Interest Income";
    pub const INTEREST_INCOME_NON_OPERATING: &str = "Interest Income Non Operating";
    pub const PRETAX_INCOME: &str = "Pretax Income";
    pub const TAX_PROVISION: &str = "Tax Provision";
    pub const NET_INCOME: &str = "Net Income";
    pub const RECONCILED_DEPRECIATION: &str = "Reconciled Depreciation";

    // Balance sheet
    pub const CASH_AND_SHORT_TERM_INVESTMENTS: &str =
        "Cash Cash Equivalents And Short Term Investments";
    pub const CASH_AND_EQUIVALENTS: &str = "Cash And Cash Equivalents";
    pub const ACCOUNTS_RECEIVABLE: &str = "Accounts Receivable";
    pub const INVENTORY: &str = "Inventory";
    pub const CURRENT_ASSETS: &str = "Current Assets";
    pub const NET_PPE: &str = "Net PPE";
    pub const GROSS_PPE: &str = "Gross PPE";
    pub const ACCUMULATED_DEPRECIATION: &str = "Accumulated Depreciation";
    pub const GOODWILL: &str = "Goodwill";
    pub const OTHER_INTANGIBLE_ASSETS: &str = "Other Intangible Assets";
    pub const TOTAL_ASSETS: &str = "Total Assets";
    pub const ACCOUNTS_PAYABLE: &str = "Accounts Payable";
    pub const CURRENT_LIABILITIES: &str = "Current Liabilities";
    pub const CURRENT_DEBT: &str = "Current Debt";
    pub const LONG_TERM_DEBT: &str = "Long Term Debt";
    pub const TOTAL_DEBT: &str = "Total Debt";
    pub const TOTAL_LIABILITIES: &str = "Total Liabilities Net Minority Interest";
    pub const STOCKHOLDERS_EQUITY: &str = "Stockholders Equity";
    pub const RETAINED_EARNINGS: &str = "Retained Earnings";
    pub const MINORITY_INTEREST: &str = "Minority Interest";

    // Cash flow statement
    pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
    pub const DEPRECIATION_AND_AMORTIZATION: &str = "Depreciation And Amortization";
    pub const CAPITAL_EXPENDITURE: &str = "Capital Expenditure";
    pub const CASH_DIVIDENDS_PAID: &str = "Cash Dividends Paid";
    pub const COMMON_STOCK_PAYMENTS: &str = "Common Stock Payments";
    pub const REPURCHASE_OF_CAPITAL_STOCK: &str = "Repurchase Of Capital Stock";
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Read access to a company's historical statements, keyed by line item and
/// fiscal year.
///
/// Implementors supply `years` and `value`; the averaging helpers are
/// provided. Every helper answers `None` rather than failing when the data
/// needed for an observation is missing, so callers can fall back to a
/// default.
pub trait HistoricalSource {
    /// Fiscal years with data for `statement`, newest first.
    fn years(&self, statement: Statement) -> Vec<i32>;

    fn value(&self, statement: Statement, field: &str, year: i32) -> Option<Decimal>;

    /// Latest fiscal year reported by any statement.
    fn base_year(&self) -> Option<i32> {
        [Statement::Income, Statement::Balance, Statement::CashFlow]
            .iter()
            .filter_map(|s| self.years(*s).first().copied())
            .max()
    }

    fn is_empty(&self) -> bool {
        self.base_year().is_none()
    }

    /// Like `value`, but a gap is reported as `MissingHistoricalField`.
    fn require(&self, statement: Statement, field: &str, year: i32) -> ForecastResult<Decimal> {
        self.value(statement, field, year)
            .ok_or_else(|| ForecastError::MissingHistoricalField {
                statement,
                field: field.to_string(),
                year,
            })
    }

    /// Mean period-over-period growth across the newest `window` steps.
    ///
    /// Pairs where either side is zero are skipped. At least two observed
    /// values are needed.
    fn growth_rate(&self, statement: Statement, field: &str, window: usize) -> Option<Rate> {
        let values: Vec<Decimal> = self
            .years(statement)
            .into_iter()
            .take(window + 1)
            .filter_map(|y| self.value(statement, field, y))
            .collect();
        if values.len() < 2 {
            return None;
        }
        let rates: Vec<Decimal> = values
            .windows(2)
            .filter(|pair| !pair[0].is_zero() && !pair[1].is_zero())
            .map(|pair| (pair[0] - pair[1]) / pair[1].abs())
            .collect();
        mean(&rates)
    }

    /// Mean of `numerator / denominator` within one statement.
    fn ratio_average(
        &self,
        statement: Statement,
        numerator: &str,
        denominator: &str,
        window: usize,
    ) -> Option<Rate> {
        self.cross_statement_ratio(statement, numerator, statement, denominator, window)
    }

    /// Mean of `field_a / field_b` where the two fields live in different
    /// statements, matched on fiscal year.
    fn cross_statement_ratio(
        &self,
        statement_a: Statement,
        field_a: &str,
        statement_b: Statement,
        field_b: &str,
        window: usize,
    ) -> Option<Rate> {
        let ratios: Vec<Decimal> = self
            .years(statement_a)
            .into_iter()
            .take(window)
            .filter_map(|y| {
                let num = self.value(statement_a, field_a, y)?;
                let den = self.value(statement_b, field_b, y)?;
                if den.is_zero() {
                    None
                } else {
                    Some(num / den)
                }
            })
            .collect();
        mean(&ratios)
    }
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

// ---------------------------------------------------------------------------
// In-memory history
// ---------------------------------------------------------------------------

/// Line item -> fiscal year end -> value.
pub type StatementTable = BTreeMap<String, BTreeMap<NaiveDate, Decimal>>;

/// Three historical statements held in memory.
///
/// Columns are keyed by fiscal year end date; lookups match on the calendar
/// year of that date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementHistory {
    #[serde(default)]
    pub income: StatementTable,
    #[serde(default)]
    pub balance: StatementTable,
    #[serde(default)]
    pub cash_flow: StatementTable,
}

impl StatementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, statement: Statement) -> &StatementTable {
        match statement {
            Statement::Income => &self.income,
            Statement::Balance => &self.balance,
            Statement::CashFlow => &self.cash_flow,
        }
    }

    fn table_mut(&mut self, statement: Statement) -> &mut StatementTable {
        match statement {
            Statement::Income => &mut self.income,
            Statement::Balance => &mut self.balance,
            Statement::CashFlow => &mut self.cash_flow,
        }
    }

    /// Record a value; an existing entry for the same date is replaced.
    pub fn insert(&mut self, statement: Statement, field: &str, period_end: NaiveDate, value: Decimal) {
        self.table_mut(statement)
            .entry(field.to_string())
            .or_default()
            .insert(period_end, value);
    }

    /// Builder form of `insert` keyed by fiscal year (period end 31 December).
    pub fn with(mut self, statement: Statement, field: &str, year: i32, value: Decimal) -> Self {
        if let Some(date) = NaiveDate::from_ymd_opt(year, 12, 31) {
            self.insert(statement, field, date, value);
        }
        self
    }

    /// Copy of this history without any period after `base_year`.
    pub fn with_base_year(&self, base_year: i32) -> StatementHistory {
        let clip = |table: &StatementTable| -> StatementTable {
            table
                .iter()
                .map(|(field, series)| {
                    let kept = series
                        .iter()
                        .filter(|(date, _)| date.year() <= base_year)
                        .map(|(d, v)| (*d, *v))
                        .collect::<BTreeMap<_, _>>();
                    (field.clone(), kept)
                })
                .filter(|(_, series)| !series.is_empty())
                .collect()
        };
        StatementHistory {
            income: clip(&self.income),
            balance: clip(&self.balance),
            cash_flow: clip(&self.cash_flow),
        }
    }
}

impl HistoricalSource for StatementHistory {
    fn years(&self, statement: Statement) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .table(statement)
            .values()
            .flat_map(|series| series.keys().map(|d| d.year()))
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years
    }

    fn value(&self, statement: Statement, field: &str, year: i32) -> Option<Decimal> {
        self.table(statement)
            .get(field)?
            .iter()
            .rev()
            .find(|(date, _)| date.year() == year)
            .map(|(_, v)| *v)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_history() -> StatementHistory {
        StatementHistory::new()
            .with(Statement::Income, fields::TOTAL_REVENUE, 2021, dec!(100))
            .with(Statement::Income, fields::TOTAL_REVENUE, 2022, dec!(110))
            .with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(121))
            .with(Statement::Income, fields::COST_OF_REVENUE, 2021, dec!(60))
            .with(Statement::Income, fields::COST_OF_REVENUE, 2022, dec!(66))
            .with(Statement::Income, fields::COST_OF_REVENUE, 2023, dec!(72.6))
            .with(Statement::Balance, fields::ACCOUNTS_RECEIVABLE, 2022, dec!(11))
            .with(Statement::Balance, fields::ACCOUNTS_RECEIVABLE, 2023, dec!(12.1))
    }

    #[test]
    fn test_years_newest_first() {
        let h = sample_history();
        assert_eq!(h.years(Statement::Income), vec![2023, 2022, 2021]);
        assert_eq!(h.years(Statement::Balance), vec![2023, 2022]);
        assert!(h.years(Statement::CashFlow).is_empty());
        assert_eq!(h.base_year(), Some(2023));
    }

    #[test]
    fn test_growth_rate_average() {
        let h = sample_history();
        // 10% each year
        let g = h
            .growth_rate(Statement::Income, fields::TOTAL_REVENUE, 3)
            .unwrap();
        assert_eq!(g, dec!(0.1));
    }

    #[test]
    fn test_growth_rate_needs_two_values() {
        let h = StatementHistory::new().with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(5));
        assert!(h
            .growth_rate(Statement::Income, fields::TOTAL_REVENUE, 3)
            .is_none());
    }

    #[test]
    fn test_growth_rate_skips_zero_pairs() {
        let h = StatementHistory::new()
            .with(Statement::Income, fields::TOTAL_REVENUE, 2021, dec!(0))
            .with(Statement::Income, fields::TOTAL_REVENUE, 2022, dec!(100))
            .with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(120));
        let g = h
            .growth_rate(Statement::Income, fields::TOTAL_REVENUE, 3)
            .unwrap();
        assert_eq!(g, dec!(0.2));
    }

    #[test]
    fn test_ratio_average() {
        let h = sample_history();
        let r = h
            .ratio_average(
                Statement::Income,
                fields::COST_OF_REVENUE,
                fields::TOTAL_REVENUE,
                3,
            )
            .unwrap();
        assert_eq!(r, dec!(0.6));
    }

    #[test]
    fn test_cross_statement_ratio_matches_years() {
        let h = sample_history();
        let r = h
            .cross_statement_ratio(
                Statement::Balance,
                fields::ACCOUNTS_RECEIVABLE,
                Statement::Income,
                fields::TOTAL_REVENUE,
                3,
            )
            .unwrap();
        assert_eq!(r, dec!(0.1));
    }

    #[test]
    fn test_missing_field_is_none() {
        let h = sample_history();
        assert!(h
            .ratio_average(Statement::Income, fields::SGA, fields::TOTAL_REVENUE, 3)
            .is_none());
        let err = h
            .require(Statement::Income, fields::SGA, 2023)
            .unwrap_err();
        assert!(matches!(err, ForecastError::MissingHistoricalField { year: 2023, .. }));
    }

    #[test]
    fn test_with_base_year_drops_later_periods() {
        let h = sample_history().with_base_year(2022);
        assert_eq!(h.base_year(), Some(2022));
        assert!(h.value(Statement::Income, fields::TOTAL_REVENUE, 2023).is_none());
        assert_eq!(
            h.value(Statement::Income, fields::TOTAL_REVENUE, 2022),
            Some(dec!(110))
        );
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "income": { "Total Revenue": { "2022-06-30": "200", "2023-06-30": 220 } }
        }"#;
        let h: StatementHistory = serde_json::from_str(json).unwrap();
        assert_eq!(
            h.value(Statement::Income, fields::TOTAL_REVENUE, 2023),
            Some(dec!(220))
        );
        assert!(h.balance.is_empty());
    }
}
