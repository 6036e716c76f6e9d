mod common;

use common::{synthetic_drivers, synthetic_fundamentals, reported_history};
use forecast_core::config::{DividendTiming, DriverConfig, ForecastPolicy};
use forecast_core::forecast::{
    build_forecast, forecast_from_history, verify_closure, ForecastInput, ForecastOutput,
    Forecaster, HistoryForecastInput,
};
use forecast_core::drivers::ForecastDrivers;
use forecast_core::fundamentals::YearZeroFundamentals;
use forecast_core::projection::IntermediateProjector;
use forecast_core::ForecastError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn run(f: &YearZeroFundamentals, d: &ForecastDrivers, p: &ForecastPolicy) -> ForecastOutput {
    Forecaster::new(f, d, p).unwrap().run().unwrap().0
}

// ===========================================================================
// Operating projection
// ===========================================================================

#[test]
fn test_revenue_and_margin_roll_forward() {
    let mut f = synthetic_fundamentals();
    f.revenue = dec!(100);
    let d = synthetic_drivers(1);
    let slots = IntermediateProjector::new(&f, &d).project().unwrap();
    let y1 = slots.get(1).unwrap();
    assert_eq!(y1.revenue, dec!(105.00));
    assert_eq!(y1.cogs, dec!(63.00));
    assert_eq!(y1.gross_profit, dec!(42.00));
}

// ===========================================================================
// Closure
// ===========================================================================

#[test]
fn test_reconciled_company_three_year_closure() {
    let f = synthetic_fundamentals();
    assert_eq!(f.total_assets(), dec!(2500));
    assert_eq!(f.total_liabilities(), dec!(1200));
    assert_eq!(f.total_equity(), dec!(1300));

    let out = run(&f, &synthetic_drivers(3), &ForecastPolicy::default());
    assert_eq!(out.balance_check.len(), 4);
    for check in &out.balance_check {
        assert!(check.abs() < dec!(0.01));
    }
}

#[test]
fn test_every_year_closes_without_a_plug() {
    let out = run(
        &synthetic_fundamentals(),
        &synthetic_drivers(10),
        &ForecastPolicy::default(),
    );
    assert_eq!(out.balance_sheets.len(), 11);
    for bs in &out.balance_sheets {
        assert!(
            bs.balance_check.abs() < dec!(0.000001),
            "year {} off by {}",
            bs.year,
            bs.balance_check
        );
    }
    verify_closure(&out.balance_sheets, dec!(0.000001)).unwrap();
}

#[test]
fn test_closure_holds_when_the_company_needs_funding() {
    // Heavy capex and a high cash floor force external financing every year
    let mut d = synthetic_drivers(6);
    d.capex_pct = dec!(0.40);
    d.min_cash_pct = dec!(0.30);
    let out = run(&synthetic_fundamentals(), &d, &ForecastPolicy::default());

    assert!(out.cash_budgets[1].financing_need > Decimal::ZERO);
    assert!(out.summary.total_new_equity > Decimal::ZERO);
    for bs in &out.balance_sheets {
        assert!(bs.balance_check.abs() < dec!(0.000001));
    }
}

#[test]
fn test_unreconciled_base_year_difference_is_carried_not_absorbed() {
    let mut f = synthetic_fundamentals();
    f.other_current_assets += dec!(7);
    let (out, warnings) = Forecaster::new(&f, &synthetic_drivers(3), &ForecastPolicy::default())
        .unwrap()
        .run()
        .unwrap();
    for check in &out.balance_check {
        assert!((*check - dec!(7)).abs() < dec!(0.000001));
    }
    assert!(warnings.iter().any(|w| w.contains("does not reconcile")));
    assert!(matches!(
        verify_closure(&out.balance_sheets, dec!(0.01)),
        Err(ForecastError::Imbalance { year: 0, .. })
    ));
}

// ===========================================================================
// Lagged interest
// ===========================================================================

#[test]
fn test_interest_charged_on_opening_debt_only() {
    let d = synthetic_drivers(5);
    let out = run(&synthetic_fundamentals(), &d, &ForecastPolicy::default());
    for k in 1..=5 {
        let opening = out.debt_schedule[k - 1].total_debt;
        assert_eq!(
            out.income_statements[k].interest_expense,
            opening * d.cost_of_debt_for(k)
        );
    }
    // Year 1 opens on the reported 100 + 800 at 5%
    assert_eq!(out.income_statements[1].interest_expense, dec!(45));
}

#[test]
fn test_same_year_financing_decisions_do_not_reach_interest() {
    let f = synthetic_fundamentals();
    let base = run(&f, &synthetic_drivers(4), &ForecastPolicy::default());

    let mut thirsty = synthetic_drivers(4);
    thirsty.min_cash_pct = dec!(0.50);
    let changed_floor = run(&f, &thirsty, &ForecastPolicy::default());

    let changed_policy = run(
        &f,
        &synthetic_drivers(4),
        &ForecastPolicy {
            st_financing_share: dec!(0.9),
            sweep_fraction: dec!(0.1),
            ..ForecastPolicy::default()
        },
    );

    // Year-1 financing differs, year-1 interest does not
    assert!(changed_floor.cash_budgets[1].financing_need > base.cash_budgets[1].financing_need);
    assert_eq!(
        changed_floor.income_statements[1].interest_expense,
        base.income_statements[1].interest_expense
    );
    assert_eq!(
        changed_policy.income_statements[1].interest_expense,
        base.income_statements[1].interest_expense
    );
    assert_eq!(
        changed_floor.income_statements[1].interest_income,
        base.income_statements[1].interest_income
    );
}

// ===========================================================================
// Short-term debt and sweep
// ===========================================================================

#[test]
fn test_short_term_debt_repaid_in_full_each_year() {
    let mut d = synthetic_drivers(5);
    d.capex_pct = dec!(0.35);
    d.min_cash_pct = dec!(0.25);
    let out = run(&synthetic_fundamentals(), &d, &ForecastPolicy::default());
    for k in 1..=5 {
        assert_eq!(
            out.cash_budgets[k].st_principal_due,
            out.debt_schedule[k - 1].st_ending
        );
        assert_eq!(out.debt_schedule[k].st_ending, out.cash_budgets[k].new_st_loan);
    }
}

#[test]
fn test_excess_cash_half_swept_and_earns_next_year() {
    let d = synthetic_drivers(3);
    let policy = ForecastPolicy::default();
    let mut f = synthetic_fundamentals();

    // Size opening cash so year 1 ends exactly 50 above the floor
    let first_pass = run(&f, &d, &policy);
    let cb = &first_pass.cash_budgets[1];
    let shift = cb.min_cash_required + dec!(50) - cb.cash_before_financing;
    f.cash += shift;
    f.other_equity += shift;

    let out = run(&f, &d, &policy);
    let cb1 = &out.cash_budgets[1];
    assert_eq!(cb1.financing_need, Decimal::ZERO);
    assert!((cb1.excess_cash - dec!(50)).abs() < dec!(0.000001));
    assert!((cb1.new_st_investment - dec!(25)).abs() < dec!(0.000001));
    assert_eq!(out.balance_sheets[1].st_investment, cb1.new_st_investment);

    // The sweep earns its return in the following year, not the year it is made
    assert_eq!(out.income_statements[1].interest_income, Decimal::ZERO);
    assert_eq!(
        out.income_statements[2].interest_income,
        cb1.new_st_investment * d.st_return_for(2)
    );
    assert_eq!(out.cash_budgets[2].st_investment_redeemed, cb1.new_st_investment);
}

#[test]
fn test_cash_never_below_floor() {
    let mut d = synthetic_drivers(8);
    d.revenue_growth = vec![
        dec!(0.15),
        dec!(-0.10),
        dec!(0.12),
        dec!(-0.05),
        dec!(0.02),
        dec!(0.15),
        dec!(0),
        dec!(0.04),
    ];
    let out = run(&synthetic_fundamentals(), &d, &ForecastPolicy::default());
    for k in 1..=8 {
        assert!(out.balance_sheets[k].cash >= out.projections[k].min_cash_required);
    }
}

// ===========================================================================
// Dividends
// ===========================================================================

#[test]
fn test_dividends_zero_in_loss_years() {
    let mut d = synthetic_drivers(3);
    d.cogs_pct = dec!(0.85);
    d.sga_pct = dec!(0.25);
    let out = run(&synthetic_fundamentals(), &d, &ForecastPolicy::default());
    for is in &out.income_statements[1..] {
        assert!(is.net_income < Decimal::ZERO);
        assert_eq!(is.dividends_paid, Decimal::ZERO);
        assert_eq!(is.tax, Decimal::ZERO);
    }
}

#[test]
fn test_following_year_dividends_lag_declaration() {
    let policy = ForecastPolicy {
        dividend_timing: DividendTiming::FollowingYear,
        ..ForecastPolicy::default()
    };
    let out = run(&synthetic_fundamentals(), &synthetic_drivers(4), &policy);
    // Year 1 pays what Year 0 paid
    assert_eq!(out.income_statements[1].dividends_paid, dec!(60));
    for k in 2..=4 {
        assert_eq!(
            out.income_statements[k].dividends_paid,
            out.income_statements[k - 1].dividends_declared
        );
    }
    for bs in &out.balance_sheets {
        assert!(bs.balance_check.abs() < dec!(0.000001));
    }
}

// ===========================================================================
// Envelope and idempotence
// ===========================================================================

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let input = ForecastInput {
        fundamentals: synthetic_fundamentals(),
        drivers: synthetic_drivers(6),
        policy: ForecastPolicy::default(),
    };
    let a = build_forecast(&input).unwrap();
    let b = build_forecast(&input).unwrap();
    assert_eq!(
        serde_json::to_value(&a.result).unwrap(),
        serde_json::to_value(&b.result).unwrap()
    );
    assert_eq!(a.warnings, b.warnings);
}

#[test]
fn test_build_forecast_metadata() {
    let input = ForecastInput {
        fundamentals: synthetic_fundamentals(),
        drivers: synthetic_drivers(2),
        policy: ForecastPolicy::default(),
    };
    let out = build_forecast(&input).unwrap();
    assert!(out.methodology.contains("No-Plug"));
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert_eq!(out.result.fiscal_year(2), Some(2025));
}

#[test]
fn test_horizon_zero_rejected() {
    let d = synthetic_drivers(0);
    let err = Forecaster::new(&synthetic_fundamentals(), &d, &ForecastPolicy::default())
        .err()
        .unwrap();
    assert!(matches!(err, ForecastError::InvalidConfiguration { .. }));
}

// ===========================================================================
// From history
// ===========================================================================

#[test]
fn test_forecast_from_reported_statements() {
    let input = HistoryForecastInput {
        history: reported_history(),
        config: DriverConfig {
            n_forecast_years: 4,
            ..DriverConfig::default()
        },
        policy: ForecastPolicy::default(),
        base_year: None,
    };
    let out = forecast_from_history(&input).unwrap().result;
    assert_eq!(out.drivers.base_year, Some(2023));
    assert_eq!(out.fundamentals.revenue, dec!(1240));
    assert_eq!(out.forecast.income_statements.len(), 5);
    for bs in &out.forecast.balance_sheets[1..] {
        let drift = bs.balance_check - out.forecast.balance_check[0];
        assert!(drift.abs() < dec!(0.000001));
    }
}

#[test]
fn test_forecast_from_earlier_base_year() {
    let input = HistoryForecastInput {
        history: reported_history(),
        config: DriverConfig {
            n_forecast_years: 2,
            ..DriverConfig::default()
        },
        policy: ForecastPolicy::default(),
        base_year: Some(2022),
    };
    let out = forecast_from_history(&input).unwrap().result;
    assert_eq!(out.fundamentals.base_year, Some(2022));
    assert_eq!(out.fundamentals.revenue, dec!(1150));
    assert_eq!(out.forecast.fiscal_year(1), Some(2023));
}
