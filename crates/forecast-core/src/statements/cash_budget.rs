use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ForecastPolicy;
use crate::drivers::ForecastDrivers;
use crate::fundamentals::YearZeroFundamentals;
use crate::projection::ProjectedYear;
use crate::statements::income::IncomeStatementYear;
use crate::statements::OpeningBalances;
use crate::types::{LineItemMap, LineItems, Money};

/// Five-module cash budget for a single year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashBudgetYear {
    pub year: usize,

    // Module 1: operating
    pub net_income: Money,
    pub depreciation: Money,
    pub amortization: Money,
    pub change_in_working_capital: Money,
    /// Return on last year's short-term investment, received in module 5
    pub interest_income_reclassified: Money,
    pub operating_cash_flow: Money,

    // Module 2: investing
    pub capex: Money,
    pub investing_cash_flow: Money,

    // Module 3: external financing
    pub beginning_cash: Money,
    pub st_principal_due: Money,
    pub lt_principal_due: Money,
    pub total_principal_due: Money,
    pub st_interest: Money,
    pub lt_interest: Money,
    pub cash_before_financing: Money,
    pub min_cash_required: Money,
    pub financing_need: Money,
    pub new_st_loan: Money,
    pub new_lt_loan: Money,
    pub financing_cash_flow: Money,

    // Module 4: owners
    pub new_equity: Money,
    pub dividends_paid: Money,
    pub stock_repurchase: Money,
    pub owner_cash_flow: Money,

    // Module 5: discretionary
    pub st_investment_redeemed: Money,
    pub st_investment_return: Money,
    pub excess_cash: Money,
    pub new_st_investment: Money,
    pub discretionary_cash_flow: Money,

    pub year_net_cash_balance: Money,
    pub cumulated_cash: Money,
}

impl CashBudgetYear {
    /// Operating cash flow less capex.
    pub fn free_cash_flow(&self) -> Money {
        self.operating_cash_flow + self.investing_cash_flow
    }
}

impl LineItems for CashBudgetYear {
    fn line_items(&self) -> LineItemMap {
        vec![
            ("net_income", self.net_income),
            ("depreciation", self.depreciation),
            ("amortization", self.amortization),
            ("change_in_working_capital", self.change_in_working_capital),
            ("interest_income_reclassified", self.interest_income_reclassified),
            ("operating_cash_flow", self.operating_cash_flow),
            ("capex", self.capex),
            ("investing_cash_flow", self.investing_cash_flow),
            ("beginning_cash", self.beginning_cash),
            ("st_principal_due", self.st_principal_due),
            ("lt_principal_due", self.lt_principal_due),
            ("total_principal_due", self.total_principal_due),
            ("st_interest", self.st_interest),
            ("lt_interest", self.lt_interest),
            ("cash_before_financing", self.cash_before_financing),
            ("min_cash_required", self.min_cash_required),
            ("financing_need", self.financing_need),
            ("new_st_loan", self.new_st_loan),
            ("new_lt_loan", self.new_lt_loan),
            ("financing_cash_flow", self.financing_cash_flow),
            ("new_equity", self.new_equity),
            ("dividends_paid", self.dividends_paid),
            ("stock_repurchase", self.stock_repurchase),
            ("owner_cash_flow", self.owner_cash_flow),
            ("st_investment_redeemed", self.st_investment_redeemed),
            ("st_investment_return", self.st_investment_return),
            ("excess_cash", self.excess_cash),
            ("new_st_investment", self.new_st_investment),
            ("discretionary_cash_flow", self.discretionary_cash_flow),
            ("year_net_cash_balance", self.year_net_cash_balance),
            ("cumulated_cash", self.cumulated_cash),
        ]
    }
}

/// Sizes financing against the minimum-cash floor and sweeps any surplus.
pub struct CashBudgetEngine<'a> {
    drivers: &'a ForecastDrivers,
    policy: &'a ForecastPolicy,
}

impl<'a> CashBudgetEngine<'a> {
    pub fn new(drivers: &'a ForecastDrivers, policy: &'a ForecastPolicy) -> Self {
        CashBudgetEngine { drivers, policy }
    }

    /// Year 0: only the cash balance and the reported repurchase carry forward.
    pub fn seed(f: &YearZeroFundamentals) -> CashBudgetYear {
        let zero = Decimal::ZERO;
        CashBudgetYear {
            year: 0,
            net_income: f.net_income,
            depreciation: f.depreciation,
            amortization: zero,
            change_in_working_capital: zero,
            interest_income_reclassified: zero,
            operating_cash_flow: f.operating_cash_flow,
            capex: f.capex,
            investing_cash_flow: -f.capex,
            beginning_cash: f.cash,
            st_principal_due: zero,
            lt_principal_due: zero,
            total_principal_due: zero,
            st_interest: zero,
            lt_interest: zero,
            cash_before_financing: f.cash,
            min_cash_required: zero,
            financing_need: zero,
            new_st_loan: zero,
            new_lt_loan: zero,
            financing_cash_flow: zero,
            new_equity: zero,
            dividends_paid: f.dividends_paid,
            stock_repurchase: f.stock_repurchase,
            owner_cash_flow: zero,
            st_investment_redeemed: zero,
            st_investment_return: zero,
            excess_cash: zero,
            new_st_investment: zero,
            discretionary_cash_flow: zero,
            year_net_cash_balance: zero,
            cumulated_cash: f.cash,
        }
    }

    /// `lt_principal_due` is the ledger's scheduled amortisation for this year.
    pub fn compute_year(
        &self,
        projected: &ProjectedYear,
        income: &IncomeStatementYear,
        opening: &OpeningBalances,
        lt_principal_due: Money,
        prior: &CashBudgetYear,
    ) -> CashBudgetYear {
        let zero = Decimal::ZERO;
        let policy = self.policy;

        // Module 1: operating. The investment return sits in net income but
        // is received with the redemption in module 5.
        let interest_income_reclassified = income.interest_income;
        let operating_cash_flow = income.net_income + income.depreciation + income.amortization
            - projected.change_in_working_capital
            - interest_income_reclassified;

        // Module 2: investing
        let investing_cash_flow = -projected.capex;

        // Owner outflows are fixed before financing is sized
        let dividends_paid = income.dividends_paid;
        let stock_repurchase = prior.stock_repurchase * policy.repurchase_fraction;

        // Module 3: external financing. Short-term debt is repaid in full.
        let st_principal_due = opening.st_debt;
        let total_principal_due = st_principal_due + lt_principal_due;
        let st_investment_redeemed = opening.st_investment;
        let st_investment_return = income.interest_income;
        let cash_before_financing = opening.cash
            + operating_cash_flow
            + investing_cash_flow
            - total_principal_due
            - dividends_paid
            - stock_repurchase
            + st_investment_redeemed
            + st_investment_return;
        let min_cash_required = projected.min_cash_required;
        let financing_need = (min_cash_required - cash_before_financing).max(zero);

        let new_st_loan = financing_need * policy.st_financing_share;
        let remainder = financing_need - new_st_loan;
        let new_lt_loan = remainder * self.drivers.pct_financing_with_debt;
        let new_equity = remainder - new_lt_loan;
        let financing_cash_flow = new_st_loan + new_lt_loan - total_principal_due;

        // Module 4: owners
        let owner_cash_flow = new_equity - dividends_paid - stock_repurchase;

        // Module 5: discretionary sweep, only when nothing had to be raised
        let excess_cash = if financing_need.is_zero() {
            (cash_before_financing - min_cash_required).max(zero)
        } else {
            zero
        };
        let new_st_investment = excess_cash * policy.sweep_fraction;
        let discretionary_cash_flow =
            st_investment_redeemed + st_investment_return - new_st_investment;

        let year_net_cash_balance = operating_cash_flow
            + investing_cash_flow
            + financing_cash_flow
            + owner_cash_flow
            + discretionary_cash_flow;
        let cumulated_cash = prior.cumulated_cash + year_net_cash_balance;

        CashBudgetYear {
            year: projected.year,
            net_income: income.net_income,
            depreciation: income.depreciation,
            amortization: income.amortization,
            change_in_working_capital: projected.change_in_working_capital,
            interest_income_reclassified,
            operating_cash_flow,
            capex: projected.capex,
            investing_cash_flow,
            beginning_cash: opening.cash,
            st_principal_due,
            lt_principal_due,
            total_principal_due,
            st_interest: opening.st_debt * projected.cost_of_debt,
            lt_interest: opening.lt_debt * projected.cost_of_debt,
            cash_before_financing,
            min_cash_required,
            financing_need,
            new_st_loan,
            new_lt_loan,
            financing_cash_flow,
            new_equity,
            dividends_paid,
            stock_repurchase,
            owner_cash_flow,
            st_investment_redeemed,
            st_investment_return,
            excess_cash,
            new_st_investment,
            discretionary_cash_flow,
            year_net_cash_balance,
            cumulated_cash,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
