use rust_decimal_macros::dec;
use std::collections::BTreeMap;

use crate::drivers::ForecastDrivers;
use crate::fundamentals::YearZeroFundamentals;

/// Fully reconciled company: assets 2500, liabilities 1200, equity 1300.
pub(crate) fn synthetic_fundamentals() -> YearZeroFundamentals {
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

pub(crate) fn synthetic_drivers(horizon: usize) -> ForecastDrivers {
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
