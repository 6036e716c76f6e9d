use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::history::{fields, HistoricalSource};
use crate::types::{Money, Statement};
use crate::validation::validate_non_negative;
use crate::ForecastResult;

/// Every Year-0 line item needed to seed a forecast.
///
/// The "other" categories are whatever the reported subtotals leave after the
/// items the forecast models explicitly; they are carried unchanged through
/// every projected year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearZeroFundamentals {
    /// Fiscal year of the seed balance sheet, when known
    #[serde(default)]
    pub base_year: Option<i32>,

    // Assets
    pub cash: Money,
    pub accounts_receivable: Money,
    pub inventory: Money,
    #[serde(default)]
    pub other_current_assets: Money,
    pub gross_ppe: Money,
    pub accumulated_depreciation: Money,
    pub net_ppe: Money,
    #[serde(default)]
    pub goodwill: Money,
    #[serde(default)]
    pub intangibles: Money,
    #[serde(default)]
    pub other_non_current_assets: Money,

    // Liabilities
    pub accounts_payable: Money,
    pub short_term_debt: Money,
    #[serde(default)]
    pub other_current_liabilities: Money,
    pub long_term_debt: Money,
    #[serde(default)]
    pub other_non_current_liabilities: Money,

    // Equity
    pub retained_earnings: Money,
    pub other_equity: Money,
    #[serde(default)]
    pub minority_interest: Money,

    // Year-0 income statement
    pub revenue: Money,
    pub cogs: Money,
    pub sga: Money,
    pub depreciation: Money,
    #[serde(default)]
    pub operating_income: Money,
    #[serde(default)]
    pub interest_expense: Money,
    #[serde(default)]
    pub interest_income: Money,
    #[serde(default)]
    pub pretax_income: Money,
    #[serde(default)]
    pub tax: Money,
    pub net_income: Money,

    // Year-0 cash flows (outflows stored as positive amounts)
    #[serde(default)]
    pub operating_cash_flow: Money,
    #[serde(default)]
    pub capex: Money,
    #[serde(default)]
    pub dividends_paid: Money,
    #[serde(default)]
    pub stock_repurchase: Money,
}

impl YearZeroFundamentals {
    pub fn total_current_assets(&self) -> Money {
        self.cash + self.accounts_receivable + self.inventory + self.other_current_assets
    }

    pub fn total_assets(&self) -> Money {
        self.total_current_assets()
            + self.net_ppe
            + self.goodwill
            + self.intangibles
            + self.other_non_current_assets
    }

    pub fn total_current_liabilities(&self) -> Money {
        self.accounts_payable + self.short_term_debt + self.other_current_liabilities
    }

    pub fn total_liabilities(&self) -> Money {
        self.total_current_liabilities() + self.long_term_debt + self.other_non_current_liabilities
    }

    pub fn total_equity(&self) -> Money {
        self.retained_earnings + self.other_equity
    }

    pub fn total_debt(&self) -> Money {
        self.short_term_debt + self.long_term_debt
    }

    /// Assets less liabilities, equity and minority interest.
    pub fn balance_check(&self) -> Money {
        self.total_assets()
            - (self.total_liabilities() + self.total_equity() + self.minority_interest)
    }

    /// Balance-sheet stocks and cash outflows must be non-negative.
    pub fn validate(&self) -> ForecastResult<()> {
        validate_non_negative("cash", self.cash)?;
        validate_non_negative("accounts_receivable", self.accounts_receivable)?;
        validate_non_negative("inventory", self.inventory)?;
        validate_non_negative("other_current_assets", self.other_current_assets)?;
        validate_non_negative("gross_ppe", self.gross_ppe)?;
        validate_non_negative("accumulated_depreciation", self.accumulated_depreciation)?;
        validate_non_negative("net_ppe", self.net_ppe)?;
        validate_non_negative("goodwill", self.goodwill)?;
        validate_non_negative("intangibles", self.intangibles)?;
        validate_non_negative("other_non_current_assets", self.other_non_current_assets)?;
        validate_non_negative("accounts_payable", self.accounts_payable)?;
        validate_non_negative("short_term_debt", self.short_term_debt)?;
        validate_non_negative("other_current_liabilities", self.other_current_liabilities)?;
        validate_non_negative("long_term_debt", self.long_term_debt)?;
        validate_non_negative(
            "other_non_current_liabilities",
            self.other_non_current_liabilities,
        )?;
        validate_non_negative("minority_interest", self.minority_interest)?;
        validate_non_negative("revenue", self.revenue)?;
        validate_non_negative("capex", self.capex)?;
        validate_non_negative("dividends_paid", self.dividends_paid)?;
        validate_non_negative("stock_repurchase", self.stock_repurchase)?;
        Ok(())
    }

    /// Read the Year-0 record from the latest fiscal year of `source`.
    ///
    /// Only base-year revenue is mandatory; every other gap reads as zero or
    /// is rebuilt from the reported subtotals.
    pub fn from_history(source: &impl HistoricalSource) -> ForecastResult<Self> {
        let year = source.base_year().ok_or_else(|| {
            ForecastError::InsufficientHistory("historical dataset is empty".into())
        })?;
        Self::from_history_at(source, year)
    }

    pub fn from_history_at(source: &impl HistoricalSource, year: i32) -> ForecastResult<Self> {
        let income = |field: &str| source.value(Statement::Income, field, year);
        let balance = |field: &str| source.value(Statement::Balance, field, year);
        let cash_flow = |field: &str| source.value(Statement::CashFlow, field, year);
        let zero = Decimal::ZERO;

        let revenue = source.require(Statement::Income, fields::TOTAL_REVENUE, year)?;

        // Assets
        let cash = balance(fields::CASH_AND_SHORT_TERM_INVESTMENTS)
            .or_else(|| balance(fields::CASH_AND_EQUIVALENTS))
            .unwrap_or(zero);
        let accounts_receivable = balance(fields::ACCOUNTS_RECEIVABLE).unwrap_or(zero);
        let inventory = balance(fields::INVENTORY).unwrap_or(zero);
        let current_assets = balance(fields::CURRENT_ASSETS)
            .unwrap_or(cash + accounts_receivable + inventory);
        let other_current_assets =
            (current_assets - cash - accounts_receivable - inventory).max(zero);

        let net_ppe = balance(fields::NET_PPE).unwrap_or(zero);
        let accumulated_depreciation = balance(fields::ACCUMULATED_DEPRECIATION).map(|v| v.abs());
        let gross_ppe = balance(fields::GROSS_PPE)
            .unwrap_or(net_ppe + accumulated_depreciation.unwrap_or(zero));
        let accumulated_depreciation =
            accumulated_depreciation.unwrap_or((gross_ppe - net_ppe).max(zero));
        let goodwill = balance(fields::GOODWILL).unwrap_or(zero);
        let intangibles = balance(fields::OTHER_INTANGIBLE_ASSETS).unwrap_or(zero);
        let total_assets = balance(fields::TOTAL_ASSETS)
            .unwrap_or(current_assets + net_ppe + goodwill + intangibles);
        let other_non_current_assets =
            (total_assets - current_assets - net_ppe - goodwill - intangibles).max(zero);

        // Liabilities
        let accounts_payable = balance(fields::ACCOUNTS_PAYABLE).unwrap_or(zero);
        let short_term_debt = balance(fields::CURRENT_DEBT).unwrap_or(zero);
        let current_liabilities =
            balance(fields::CURRENT_LIABILITIES).unwrap_or(accounts_payable + short_term_debt);
        let other_current_liabilities =
            (current_liabilities - accounts_payable - short_term_debt).max(zero);
        let long_term_debt = balance(fields::LONG_TERM_DEBT).unwrap_or_else(|| {
            balance(fields::TOTAL_DEBT)
                .map(|total| (total - short_term_debt).max(zero))
                .unwrap_or(zero)
        });
        let total_liabilities =
            balance(fields::TOTAL_LIABILITIES).unwrap_or(current_liabilities + long_term_debt);
        let other_non_current_liabilities =
            (total_liabilities - current_liabilities - long_term_debt).max(zero);

        // Equity
        let minority_interest = balance(fields::MINORITY_INTEREST).unwrap_or(zero).max(zero);
        let total_equity = balance(fields::STOCKHOLDERS_EQUITY)
            .unwrap_or(total_assets - total_liabilities - minority_interest);
        let retained_earnings = balance(fields::RETAINED_EARNINGS).unwrap_or(zero);
        let other_equity = total_equity - retained_earnings;

        // Income statement
        let cogs = income(fields::COST_OF_REVENUE).unwrap_or(zero);
        let sga = income(fields::SGA).unwrap_or(zero);
        let depreciation = income(fields::RECONCILED_DEPRECIATION)
            .or_else(|| cash_flow(fields::DEPRECIATION_AND_AMORTIZATION))
            .unwrap_or(zero)
            .abs();
        let operating_income = income(fields::OPERATING_INCOME)
            .unwrap_or(revenue - cogs - sga - depreciation);
        let interest_expense = income(fields::INTEREST_EXPENSE).unwrap_or(zero).abs();
        let interest_income = income(fields::INTEREST_INCOME)
            .or_else(|| income(fields::INTEREST_INCOME_NON_OPERATING))
            .unwrap_or(zero);
        let pretax_income = income(fields::PRETAX_INCOME)
            .unwrap_or(operating_income - interest_expense + interest_income);
        let tax = income(fields::TAX_PROVISION).unwrap_or(zero);
        let net_income = income(fields::NET_INCOME).unwrap_or(pretax_income - tax);

        // Cash flows
        let operating_cash_flow = cash_flow(fields::OPERATING_CASH_FLOW).unwrap_or(zero);
        let capex = cash_flow(fields::CAPITAL_EXPENDITURE).unwrap_or(zero).abs();
        let dividends_paid = cash_flow(fields::CASH_DIVIDENDS_PAID).unwrap_or(zero).abs();
        let stock_repurchase = cash_flow(fields::COMMON_STOCK_PAYMENTS)
            .or_else(|| cash_flow(fields::REPURCHASE_OF_CAPITAL_STOCK))
            .unwrap_or(zero)
            .abs();

        Ok(YearZeroFundamentals {
            base_year: Some(year),
            cash,
            accounts_receivable,
            inventory,
            other_current_assets,
            gross_ppe,
            accumulated_depreciation,
            net_ppe,
            goodwill,
            intangibles,
            other_non_current_assets,
            accounts_payable,
            short_term_debt,
            other_current_liabilities,
            long_term_debt,
            other_non_current_liabilities,
            retained_earnings,
            other_equity,
            minority_interest,
            revenue,
            cogs,
            sga,
            depreciation,
            operating_income,
            interest_expense,
            interest_income,
            pretax_income,
            tax,
            net_income,
            operating_cash_flow,
            capex,
            dividends_paid,
            stock_repurchase,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StatementHistory;
    use rust_decimal_macros::dec;

    fn reported_history() -> StatementHistory {
        StatementHistory::new()
            .with(Statement::Income, fields::TOTAL_REVENUE, 2023, dec!(1000))
            .with(Statement::Income, fields::COST_OF_REVENUE, 2023, dec!(600))
            .with(Statement::Income, fields::SGA, 2023, dec!(200))
            .with(Statement::Income, fields::RECONCILED_DEPRECIATION, 2023, dec!(50))
            .with(Statement::Income, fields::NET_INCOME, 2023, dec!(90))
            .with(Statement::Balance, fields::CASH_AND_EQUIVALENTS, 2023, dec!(100))
            .with(Statement::Balance, fields::ACCOUNTS_RECEIVABLE, 2023, dec!(80))
            .with(Statement::Balance, fields::INVENTORY, 2023, dec!(30))
            .with(Statement::Balance, fields::CURRENT_ASSETS, 2023, dec!(250))
            .with(Statement::Balance, fields::NET_PPE, 2023, dec!(500))
            .with(Statement::Balance, fields::GROSS_PPE, 2023, dec!(800))
            .with(Statement::Balance, fields::GOODWILL, 2023, dec!(100))
            .with(Statement::Balance, fields::TOTAL_ASSETS, 2023, dec!(900))
            .with(Statement::Balance, fields::ACCOUNTS_PAYABLE, 2023, dec!(60))
            .with(Statement::Balance, fields::CURRENT_DEBT, 2023, dec!(40))
            .with(Statement::Balance, fields::CURRENT_LIABILITIES, 2023, dec!(150))
            .with(Statement::Balance, fields::LONG_TERM_DEBT, 2023, dec!(300))
            .with(Statement::Balance, fields::TOTAL_LIABILITIES, 2023, dec!(480))
            .with(Statement::Balance, fields::STOCKHOLDERS_EQUITY, 2023, dec!(400))
            .with(Statement::Balance, fields::RETAINED_EARNINGS, 2023, dec!(250))
            .with(Statement::Balance, fields::MINORITY_INTEREST, 2023, dec!(20))
            .with(Statement::CashFlow, fields::CAPITAL_EXPENDITURE, 2023, dec!(-70))
            .with(Statement::CashFlow, fields::CASH_DIVIDENDS_PAID, 2023, dec!(-45))
    }

    #[test]
    fn test_residual_categories() {
        let f = YearZeroFundamentals::from_history(&reported_history()).unwrap();
        assert_eq!(f.base_year, Some(2023));
        // 250 - 100 - 80 - 30
        assert_eq!(f.other_current_assets, dec!(40));
        // 900 - 250 - 500 - 100
        assert_eq!(f.other_non_current_assets, dec!(50));
        // 150 - 60 - 40
        assert_eq!(f.other_current_liabilities, dec!(50));
        // 480 - 150 - 300
        assert_eq!(f.other_non_current_liabilities, dec!(30));
        assert_eq!(f.other_equity, dec!(150));
        assert_eq!(f.accumulated_depreciation, dec!(300));
    }

    #[test]
    fn test_reported_history_reconciles() {
        let f = YearZeroFundamentals::from_history(&reported_history()).unwrap();
        assert_eq!(f.total_assets(), dec!(900));
        assert_eq!(f.total_liabilities(), dec!(480));
        assert_eq!(f.balance_check(), Decimal::ZERO);
    }

    #[test]
    fn test_cash_flow_outflows_are_positive() {
        let f = YearZeroFundamentals::from_history(&reported_history()).unwrap();
        assert_eq!(f.capex, dec!(70));
        assert_eq!(f.dividends_paid, dec!(45));
        assert_eq!(f.stock_repurchase, Decimal::ZERO);
    }

    #[test]
    fn test_missing_revenue_is_an_error() {
        let h = StatementHistory::new().with(Statement::Balance, fields::INVENTORY, 2023, dec!(5));
        let err = YearZeroFundamentals::from_history(&h).unwrap_err();
        assert!(matches!(err, ForecastError::MissingHistoricalField { .. }));
    }

    #[test]
    fn test_empty_history_is_insufficient() {
        let err = YearZeroFundamentals::from_history(&StatementHistory::new()).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientHistory(_)));
    }

    #[test]
    fn test_negative_balance_rejected() {
        let mut f = YearZeroFundamentals::from_history(&reported_history()).unwrap();
        f.inventory = dec!(-1);
        assert!(f.validate().is_err());
    }
}
