use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::debt::DebtLedgerYear;
use crate::fundamentals::YearZeroFundamentals;
use crate::projection::ProjectedYear;
use crate::statements::cash_budget::CashBudgetYear;
use crate::statements::income::IncomeStatementYear;
use crate::types::{LineItemMap, LineItems, Money};

/// Balance sheet for a single year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetYear {
    pub year: usize,

    // Assets
    pub cash: Money,
    pub accounts_receivable: Money,
    pub inventory: Money,
    pub st_investment: Money,
    pub other_current_assets: Money,
    pub total_current_assets: Money,
    pub gross_ppe: Money,
    pub accumulated_depreciation: Money,
    pub net_ppe: Money,
    pub goodwill: Money,
    pub intangibles: Money,
    pub other_non_current_assets: Money,
    pub total_assets: Money,

    // Liabilities
    pub accounts_payable: Money,
    pub short_term_debt: Money,
    pub other_current_liabilities: Money,
    pub total_current_liabilities: Money,
    pub long_term_debt: Money,
    pub other_non_current_liabilities: Money,
    pub total_liabilities: Money,

    // Equity
    pub retained_earnings: Money,
    pub other_equity: Money,
    pub total_equity: Money,
    pub minority_interest: Money,
    pub total_liabilities_and_equity: Money,

    /// Assets less liabilities, equity and minority interest
    pub balance_check: Money,
}

impl BalanceSheetYear {
    pub fn total_debt(&self) -> Money {
        self.short_term_debt + self.long_term_debt
    }
}

impl LineItems for BalanceSheetYear {
    fn line_items(&self) -> LineItemMap {
        vec![
            ("cash", self.cash),
            ("accounts_receivable", self.accounts_receivable),
            ("inventory", self.inventory),
            ("st_investment", self.st_investment),
            ("other_current_assets", self.other_current_assets),
            ("total_current_assets", self.total_current_assets),
            ("gross_ppe", self.gross_ppe),
            ("accumulated_depreciation", self.accumulated_depreciation),
            ("net_ppe", self.net_ppe),
            ("goodwill", self.goodwill),
            ("intangibles", self.intangibles),
            ("other_non_current_assets", self.other_non_current_assets),
            ("total_assets", self.total_assets),
            ("accounts_payable", self.accounts_payable),
            ("short_term_debt", self.short_term_debt),
            ("other_current_liabilities", self.other_current_liabilities),
            ("total_current_liabilities", self.total_current_liabilities),
            ("long_term_debt", self.long_term_debt),
            ("other_non_current_liabilities", self.other_non_current_liabilities),
            ("total_liabilities", self.total_liabilities),
            ("retained_earnings", self.retained_earnings),
            ("other_equity", self.other_equity),
            ("total_equity", self.total_equity),
            ("minority_interest", self.minority_interest),
            ("total_liabilities_and_equity", self.total_liabilities_and_equity),
            ("balance_check", self.balance_check),
        ]
    }
}

/// The pieces of a year that feed its balance sheet.
pub struct YearInputs<'r> {
    pub projected: &'r ProjectedYear,
    pub income: &'r IncomeStatementYear,
    pub budget: &'r CashBudgetYear,
    pub debt: &'r DebtLedgerYear,
}

/// Assembles balance sheets from the per-year records. Nothing is solved for:
/// every line comes from an upstream record or is held at Year 0.
pub struct BalanceSheetCompiler<'a> {
    fundamentals: &'a YearZeroFundamentals,
}

impl<'a> BalanceSheetCompiler<'a> {
    pub fn new(fundamentals: &'a YearZeroFundamentals) -> Self {
        BalanceSheetCompiler { fundamentals }
    }

    /// Year 0 as reported.
    pub fn seed(&self) -> BalanceSheetYear {
        let f = self.fundamentals;
        assemble(
            0,
            Parts {
                cash: f.cash,
                accounts_receivable: f.accounts_receivable,
                inventory: f.inventory,
                st_investment: Decimal::ZERO,
                gross_ppe: f.gross_ppe,
                accumulated_depreciation: f.accumulated_depreciation,
                net_ppe: f.net_ppe,
                goodwill: f.goodwill,
                intangibles: f.intangibles,
                accounts_payable: f.accounts_payable,
                short_term_debt: f.short_term_debt,
                long_term_debt: f.long_term_debt,
                retained_earnings: f.retained_earnings,
                other_equity: f.other_equity,
            },
            f,
        )
    }

    pub fn compile(&self, inputs: &YearInputs<'_>, prior: &BalanceSheetYear) -> BalanceSheetYear {
        let YearInputs {
            projected,
            income,
            budget,
            debt,
        } = inputs;
        let other_equity = prior.other_equity + budget.new_equity - budget.stock_repurchase;
        assemble(
            projected.year,
            Parts {
                cash: budget.cumulated_cash,
                accounts_receivable: projected.accounts_receivable,
                inventory: projected.inventory,
                st_investment: budget.new_st_investment,
                gross_ppe: projected.gross_ppe,
                accumulated_depreciation: projected.accumulated_depreciation,
                net_ppe: projected.net_ppe,
                goodwill: projected.goodwill,
                intangibles: projected.intangibles,
                accounts_payable: projected.accounts_payable,
                short_term_debt: debt.st_ending,
                long_term_debt: debt.lt_ending,
                retained_earnings: income.retained_earnings,
                other_equity,
            },
            self.fundamentals,
        )
    }
}

struct Parts {
    cash: Money,
    accounts_receivable: Money,
    inventory: Money,
    st_investment: Money,
    gross_ppe: Money,
    accumulated_depreciation: Money,
    net_ppe: Money,
    goodwill: Money,
    intangibles: Money,
    accounts_payable: Money,
    short_term_debt: Money,
    long_term_debt: Money,
    retained_earnings: Money,
    other_equity: Money,
}

fn assemble(year: usize, p: Parts, held: &YearZeroFundamentals) -> BalanceSheetYear {
    let total_current_assets = p.cash
        + p.accounts_receivable
        + p.inventory
        + p.st_investment
        + held.other_current_assets;
    let total_assets = total_current_assets
        + p.net_ppe
        + p.goodwill
        + p.intangibles
        + held.other_non_current_assets;

    let total_current_liabilities =
        p.accounts_payable + p.short_term_debt + held.other_current_liabilities;
    let total_liabilities =
        total_current_liabilities + p.long_term_debt + held.other_non_current_liabilities;

    let total_equity = p.retained_earnings + p.other_equity;
    let total_liabilities_and_equity = total_liabilities + total_equity + held.minority_interest;

    BalanceSheetYear {
        year,
        cash: p.cash,
        accounts_receivable: p.accounts_receivable,
        inventory: p.inventory,
        st_investment: p.st_investment,
        other_current_assets: held.other_current_assets,
        total_current_assets,
        gross_ppe: p.gross_ppe,
        accumulated_depreciation: p.accumulated_depreciation,
        net_ppe: p.net_ppe,
        goodwill: p.goodwill,
        intangibles: p.intangibles,
        other_non_current_assets: held.other_non_current_assets,
        total_assets,
        accounts_payable: p.accounts_payable,
        short_term_debt: p.short_term_debt,
        other_current_liabilities: held.other_current_liabilities,
        total_current_liabilities,
        long_term_debt: p.long_term_debt,
        other_non_current_liabilities: held.other_non_current_liabilities,
        total_liabilities,
        retained_earnings: p.retained_earnings,
        other_equity: p.other_equity,
        total_equity,
        minority_interest: held.minority_interest,
        total_liabilities_and_equity,
        balance_check: total_assets - total_liabilities_and_equity,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
