use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{DividendTiming, ForecastPolicy};
use crate::drivers::ForecastDrivers;
use crate::fundamentals::YearZeroFundamentals;
use crate::projection::ProjectedYear;
use crate::statements::OpeningBalances;
use crate::types::{LineItemMap, LineItems, Money};

/// Income statement for a single year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementYear {
    pub year: usize,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
    pub sga: Money,
    pub depreciation: Money,
    pub amortization: Money,
    pub operating_income: Money,
    pub interest_expense: Money,
    pub interest_income: Money,
    pub ebt: Money,
    pub tax: Money,
    pub net_income: Money,
    pub dividends_declared: Money,
    pub dividends_paid: Money,
    pub retained_earnings: Money,
}

impl IncomeStatementYear {
    pub fn ebitda(&self) -> Money {
        self.operating_income + self.depreciation + self.amortization
    }
}

impl LineItems for IncomeStatementYear {
    fn line_items(&self) -> LineItemMap {
        vec![
            ("revenue", self.revenue),
            ("cogs", self.cogs),
            ("gross_profit", self.gross_profit),
            ("sga", self.sga),
            ("depreciation", self.depreciation),
            ("amortization", self.amortization),
            ("operating_income", self.operating_income),
            ("interest_expense", self.interest_expense),
            ("interest_income", self.interest_income),
            ("ebt", self.ebt),
            ("tax", self.tax),
            ("net_income", self.net_income),
            ("dividends_declared", self.dividends_declared),
            ("dividends_paid", self.dividends_paid),
            ("retained_earnings", self.retained_earnings),
        ]
    }
}

/// Per-year P&L. Interest is charged on balances carried in from the prior
/// year, so nothing here depends on this year's financing.
pub struct IncomeStatementEngine<'a> {
    drivers: &'a ForecastDrivers,
    policy: &'a ForecastPolicy,
}

impl<'a> IncomeStatementEngine<'a> {
    pub fn new(drivers: &'a ForecastDrivers, policy: &'a ForecastPolicy) -> Self {
        IncomeStatementEngine { drivers, policy }
    }

    /// Year 0 as reported.
    pub fn seed(f: &YearZeroFundamentals) -> IncomeStatementYear {
        IncomeStatementYear {
            year: 0,
            revenue: f.revenue,
            cogs: f.cogs,
            gross_profit: f.revenue - f.cogs,
            sga: f.sga,
            depreciation: f.depreciation,
            amortization: Decimal::ZERO,
            operating_income: f.operating_income,
            interest_expense: f.interest_expense,
            interest_income: f.interest_income,
            ebt: f.pretax_income,
            tax: f.tax,
            net_income: f.net_income,
            dividends_declared: f.dividends_paid,
            dividends_paid: f.dividends_paid,
            retained_earnings: f.retained_earnings,
        }
    }

    pub fn compute_year(
        &self,
        projected: &ProjectedYear,
        opening: &OpeningBalances,
        prior: &IncomeStatementYear,
    ) -> IncomeStatementYear {
        let d = self.drivers;
        let year = projected.year;

        let operating_income = projected.gross_profit
            - projected.sga
            - projected.depreciation
            - projected.intangibles_amortization;
        let interest_expense = opening.total_debt() * projected.cost_of_debt;
        let interest_income = opening.st_investment * projected.st_investment_return;
        let ebt = operating_income - interest_expense + interest_income;
        let tax = (ebt * d.tax_rate).max(Decimal::ZERO);
        let net_income = ebt - tax;

        let dividends_declared = (net_income * d.payout_ratio).max(Decimal::ZERO);
        let dividends_paid = match self.policy.dividend_timing {
            DividendTiming::SameYear => dividends_declared,
            DividendTiming::FollowingYear => prior.dividends_declared,
        };
        let retained_earnings = prior.retained_earnings + net_income - dividends_paid;

        IncomeStatementYear {
            year,
            revenue: projected.revenue,
            cogs: projected.cogs,
            gross_profit: projected.gross_profit,
            sga: projected.sga,
            depreciation: projected.depreciation,
            amortization: projected.intangibles_amortization,
            operating_income,
            interest_expense,
            interest_income,
            ebt,
            tax,
            net_income,
            dividends_declared,
            dividends_paid,
            retained_earnings,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
