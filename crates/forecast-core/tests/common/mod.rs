//! Integration-test copies of `src/test_fixtures.rs`, which is only
//! compiled for unit tests. Keep the two in step.
#![allow(dead_code)]

use forecast_core::drivers::ForecastDrivers;
use forecast_core::fundamentals::YearZeroFundamentals;
use forecast_core::history::{fields, StatementHistory};
use forecast_core::Statement;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Fully reconciled company: assets 2500, liabilities 1200, equity 1300.
pub fn synthetic_fundamentals() -> YearZeroFundamentals {
    YearZeroFundamentals {
        base_year: Some(2023),
        cash: dec!(200),
        accounts_receivable: dec!(160),
        inventory: dec!(60),
        other_current_assets: dec!(80),
        gross_ppe: dec!(2000),
        accumulated_depreciation: dec!(600),
        net_ppe: dec!(1400),
        goodwill: dec!(300),
        intangibles: dec!(200),
        other_non_current_assets: dec!(100),
        accounts_payable: dec!(120),
        short_term_debt: dec!(100),
        other_current_liabilities: dec!(80),
        long_term_debt: dec!(800),
        other_non_current_liabilities: dec!(100),
        retained_earnings: dec!(900),
        other_equity: dec!(400),
        minority_interest: dec!(0),
        revenue: dec!(2000),
        cogs: dec!(1200),
        sga: dec!(400),
        depreciation: dec!(140),
        operating_income: dec!(260),
        interest_expense: dec!(45),
        interest_income: dec!(0),
        pretax_income: dec!(215),
        tax: dec!(43),
        net_income: dec!(172),
        operating_cash_flow: dec!(300),
        capex: dec!(160),
        dividends_paid: dec!(60),
        stock_repurchase: dec!(20),
    }
}

pub fn synthetic_drivers(horizon: usize) -> ForecastDrivers {
    ForecastDrivers {
        horizon,
        revenue_growth: vec![dec!(0.05); horizon],
        cost_of_debt: vec![dec!(0.05); horizon],
        st_investment_return: vec![dec!(0.03); horizon],
        cogs_pct: dec!(0.60),
        sga_pct: dec!(0.20),
        ar_pct: dec!(0.08),
        inventory_pct: dec!(0.05),
        ap_pct: dec!(0.10),
        capex_pct: dec!(0.08),
        min_cash_pct: dec!(0.10),
        depreciation_rate: dec!(0.10),
        depreciation_years: dec!(10),
        tax_rate: dec!(0.25),
        payout_ratio: dec!(0.35),
        pct_financing_with_debt: dec!(0.70),
        st_loan_years: dec!(1),
        lt_loan_years: dec!(10),
        intangibles_amortization_rate: dec!(0),
        provenance: BTreeMap::new(),
    }
}

/// Four reported years of a mid-sized manufacturer.
pub fn reported_history() -> StatementHistory {
    let mut h = StatementHistory::new();
    let years = [
        (2020, dec!(1000), dec!(80)),
        (2021, dec!(1080), dec!(90)),
        (2022, dec!(1150), dec!(96)),
        (2023, dec!(1240), dec!(104)),
    ];
    for (year, revenue, net_income) in years {
        h = h
            .with(Statement::Income, fields::TOTAL_REVENUE, year, revenue)
            .with(Statement::Income, fields::COST_OF_REVENUE, year, revenue * dec!(0.62))
            .with(Statement::Income, fields::SGA, year, revenue * dec!(0.18))
            .with(Statement::Income, fields::RECONCILED_DEPRECIATION, year, dec!(60))
            .with(Statement::Income, fields::INTEREST_EXPENSE, year, dec!(24))
            .with(Statement::Income, fields::PRETAX_INCOME, year, net_income / dec!(0.75))
            .with(Statement::Income, fields::TAX_PROVISION, year, net_income / dec!(3))
            .with(Statement::Income, fields::NET_INCOME, year, net_income)
            .with(Statement::Balance, fields::CASH_AND_EQUIVALENTS, year, dec!(90))
            .with(Statement::Balance, fields::ACCOUNTS_RECEIVABLE, year, revenue * dec!(0.1))
            .with(Statement::Balance, fields::INVENTORY, year, revenue * dec!(0.05))
            .with(Statement::Balance, fields::NET_PPE, year, dec!(600))
            .with(Statement::Balance, fields::GROSS_PPE, year, dec!(900))
            .with(Statement::Balance, fields::ACCOUNTS_PAYABLE, year, revenue * dec!(0.07))
            .with(Statement::Balance, fields::CURRENT_DEBT, year, dec!(50))
            .with(Statement::Balance, fields::LONG_TERM_DEBT, year, dec!(350))
            .with(Statement::Balance, fields::TOTAL_DEBT, year, dec!(400))
            .with(Statement::Balance, fields::RETAINED_EARNINGS, year, dec!(300))
            .with(Statement::CashFlow, fields::CAPITAL_EXPENDITURE, year, revenue * dec!(-0.06))
            .with(Statement::CashFlow, fields::CASH_DIVIDENDS_PAID, year, net_income * dec!(-0.4));
    }
    h
}
