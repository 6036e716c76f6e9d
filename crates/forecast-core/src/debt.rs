use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::arena::YearSlots;
use crate::error::ForecastError;
use crate::types::{with_metadata, ComputationOutput, LineItemMap, LineItems, Money, Rate, Years};
use crate::validation::{validate_horizon, validate_non_negative, validate_positive, validate_rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Vintages
// ---------------------------------------------------------------------------

/// One long-term loan origination, amortised straight-line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtVintage {
    pub amount: Money,
    pub origination_year: usize,
    pub term: Years,
    /// Fixed at origination
    pub payment: Money,
}

impl DebtVintage {
    pub fn new(amount: Money, origination_year: usize, term: Years) -> ForecastResult<Self> {
        validate_non_negative("amount", amount)?;
        validate_positive("term", term)?;
        Ok(DebtVintage {
            amount,
            origination_year,
            term,
            payment: amount / term,
        })
    }

    /// Number of instalments; a fractional term ends with a short one.
    pub fn instalments(&self) -> usize {
        self.term.ceil().to_usize().unwrap_or(usize::MAX)
    }

    /// Principal repaid in `year`.
    ///
    /// The last instalment is whatever is left, so the instalments always
    /// sum to the original amount.
    pub fn principal_due(&self, year: usize) -> Money {
        if year <= self.origination_year {
            return Decimal::ZERO;
        }
        let age = year - self.origination_year;
        let n = self.instalments();
        if age < n {
            self.payment
        } else if age == n {
            (self.amount - self.payment * Decimal::from(n - 1)).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }

    /// Principal still outstanding at the end of `year`.
    pub fn balance_after(&self, year: usize) -> Money {
        if year < self.origination_year {
            return Decimal::ZERO;
        }
        let age = year - self.origination_year;
        if age >= self.instalments() {
            Decimal::ZERO
        } else {
            self.amount - self.payment * Decimal::from(age)
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Roll {
    beginning: Money,
    principal_paid: Money,
    new_loan: Money,
    ending: Money,
}

impl Roll {
    fn opening(balance: Money) -> Self {
        Roll {
            beginning: balance,
            principal_paid: Decimal::ZERO,
            new_loan: Decimal::ZERO,
            ending: balance,
        }
    }
}

/// Debt movements for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtLedgerYear {
    pub year: usize,
    pub st_beginning: Money,
    pub st_principal_paid: Money,
    pub st_new_loan: Money,
    pub st_ending: Money,
    pub lt_beginning: Money,
    pub lt_principal_paid: Money,
    pub lt_new_loan: Money,
    pub lt_ending: Money,
    pub total_debt: Money,
}

impl LineItems for DebtLedgerYear {
    fn line_items(&self) -> LineItemMap {
        vec![
            ("st_beginning", self.st_beginning),
            ("st_principal_paid", self.st_principal_paid),
            ("st_new_loan", self.st_new_loan),
            ("st_ending", self.st_ending),
            ("lt_beginning", self.lt_beginning),
            ("lt_principal_paid", self.lt_principal_paid),
            ("lt_new_loan", self.lt_new_loan),
            ("lt_ending", self.lt_ending),
            ("total_debt", self.total_debt),
        ]
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Short-term debt (rolled in full every year) and long-term debt (tracked
/// per vintage).
#[derive(Debug, Clone)]
pub struct DebtLedger {
    lt_term: Years,
    vintages: Vec<DebtVintage>,
    short_term: YearSlots<Roll>,
    long_term: YearSlots<Roll>,
}

impl DebtLedger {
    /// Ledger for years `0..=horizon`; new long-term loans amortise over
    /// `lt_term` years.
    pub fn new(horizon: usize, lt_term: Years) -> ForecastResult<Self> {
        validate_horizon("horizon", horizon)?;
        validate_positive("lt_loan_years", lt_term)?;
        Ok(DebtLedger {
            lt_term,
            vintages: Vec::new(),
            short_term: YearSlots::new("short_term_debt", horizon),
            long_term: YearSlots::new("long_term_debt", horizon),
        })
    }

    /// Seed Year 0. Existing long-term debt becomes one legacy vintage with
    /// `legacy_term` years left to run.
    pub fn initialize(&mut self, st0: Money, lt0: Money, legacy_term: Years) -> ForecastResult<()> {
        validate_non_negative("short_term_debt", st0)?;
        validate_non_negative("long_term_debt", lt0)?;
        validate_positive("legacy_term", legacy_term)?;
        if lt0 > Decimal::ZERO {
            self.vintages.push(DebtVintage::new(lt0, 0, legacy_term)?);
        }
        self.short_term.finalize(0, Roll::opening(st0))?;
        self.long_term.finalize(0, Roll::opening(lt0))?;
        Ok(())
    }

    pub fn vintages(&self) -> &[DebtVintage] {
        &self.vintages
    }

    pub fn st_ending(&self, year: usize) -> ForecastResult<Money> {
        Ok(self.short_term.get(year)?.ending)
    }

    pub fn lt_ending(&self, year: usize) -> ForecastResult<Money> {
        Ok(self.long_term.get(year)?.ending)
    }

    /// Scheduled long-term principal across every vintage in `year`.
    pub fn total_principal_due(&self, year: usize) -> Money {
        self.vintages.iter().map(|v| v.principal_due(year)).sum()
    }

    /// Remaining principal of all vintages at the end of `year`.
    pub fn outstanding(&self, year: usize) -> Money {
        self.vintages.iter().map(|v| v.balance_after(year)).sum()
    }

    /// Repay `principal_paid` of last year's short-term debt and draw
    /// `new_loan`. Returns the ending balance.
    pub fn roll_short_term(
        &mut self,
        year: usize,
        new_loan: Money,
        principal_paid: Money,
    ) -> ForecastResult<Money> {
        validate_non_negative("new_loan", new_loan)?;
        validate_non_negative("principal_paid", principal_paid)?;
        let beginning = self.opening(&self.short_term, year)?;
        let ending = (beginning - principal_paid + new_loan).max(Decimal::ZERO);
        self.short_term.finalize(
            year,
            Roll {
                beginning,
                principal_paid,
                new_loan,
                ending,
            },
        )?;
        Ok(ending)
    }

    /// Charge this year's scheduled amortisation and register `new_loan` as a
    /// fresh vintage. Returns the ending balance.
    pub fn roll_long_term(&mut self, year: usize, new_loan: Money) -> ForecastResult<Money> {
        validate_non_negative("new_loan", new_loan)?;
        let beginning = self.opening(&self.long_term, year)?;
        let principal_paid = self.total_principal_due(year);
        if new_loan > Decimal::ZERO {
            self.vintages
                .push(DebtVintage::new(new_loan, year, self.lt_term)?);
        }
        let ending = (beginning + new_loan - principal_paid).max(Decimal::ZERO);
        self.long_term.finalize(
            year,
            Roll {
                beginning,
                principal_paid,
                new_loan,
                ending,
            },
        )?;
        debug!(year, %principal_paid, %new_loan, %ending, "long-term debt rolled");
        Ok(ending)
    }

    fn opening(&self, slots: &YearSlots<Roll>, year: usize) -> ForecastResult<Money> {
        let prior = year.checked_sub(1).ok_or_else(|| ForecastError::InvalidInput {
            field: "year".into(),
            reason: "Year 0 is seeded by initialize".into(),
        })?;
        Ok(slots.read_for(year, prior)?.ending)
    }

    pub fn year_record(&self, year: usize) -> ForecastResult<DebtLedgerYear> {
        let st = self.short_term.get(year)?;
        let lt = self.long_term.get(year)?;
        Ok(DebtLedgerYear {
            year,
            st_beginning: st.beginning,
            st_principal_paid: st.principal_paid,
            st_new_loan: st.new_loan,
            st_ending: st.ending,
            lt_beginning: lt.beginning,
            lt_principal_paid: lt.principal_paid,
            lt_new_loan: lt.new_loan,
            lt_ending: lt.ending,
            total_debt: st.ending + lt.ending,
        })
    }

    /// Per-year records for years `0..=horizon` plus every vintage.
    pub fn into_schedule(self) -> ForecastResult<(Vec<DebtLedgerYear>, Vec<DebtVintage>)> {
        let years = (0..=self.short_term.horizon())
            .map(|y| self.year_record(y))
            .collect::<ForecastResult<Vec<_>>>()?;
        Ok((years, self.vintages))
    }
}

// ---------------------------------------------------------------------------
// Standalone schedule
// ---------------------------------------------------------------------------

/// Debt balances rolled forward under a given borrowing plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtScheduleInput {
    pub short_term_debt: Money,
    pub long_term_debt: Money,
    /// Years left on the existing long-term debt
    pub legacy_term: Years,
    /// Term of new long-term loans
    pub lt_loan_years: Years,
    pub horizon: usize,
    /// New short-term loan per year (year 1 first); missing years draw nothing
    #[serde(default)]
    pub new_short_term_loans: Vec<Money>,
    #[serde(default)]
    pub new_long_term_loans: Vec<Money>,
    /// Rate applied to opening total debt, if interest should be reported
    #[serde(default)]
    pub interest_rate: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtScheduleOutput {
    pub years: Vec<DebtLedgerYear>,
    pub vintages: Vec<DebtVintage>,
    pub interest: Vec<Money>,
    pub total_principal_paid: Money,
    pub total_interest: Money,
}

/// Roll a ledger through `horizon` years of planned borrowing.
pub fn build_debt_schedule(
    input: &DebtScheduleInput,
) -> ForecastResult<ComputationOutput<DebtScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(rate) = input.interest_rate {
        validate_rate("interest_rate", rate)?;
    }
    for (field, loans) in [
        ("new_short_term_loans", &input.new_short_term_loans),
        ("new_long_term_loans", &input.new_long_term_loans),
    ] {
        if loans.len() > input.horizon {
            warnings.push(format!(
                "{field}: {} values supplied, only the first {} are used",
                loans.len(),
                input.horizon
            ));
        }
    }

    let mut ledger = DebtLedger::new(input.horizon, input.lt_loan_years)?;
    ledger.initialize(input.short_term_debt, input.long_term_debt, input.legacy_term)?;

    let rate = input.interest_rate.unwrap_or(Decimal::ZERO);
    let mut interest = Vec::with_capacity(input.horizon);
    for year in 1..=input.horizon {
        let opening = ledger.st_ending(year - 1)? + ledger.lt_ending(year - 1)?;
        interest.push(opening * rate);

        let st_paid = ledger.st_ending(year - 1)?;
        let st_new = input
            .new_short_term_loans
            .get(year - 1)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let lt_new = input
            .new_long_term_loans
            .get(year - 1)
            .copied()
            .unwrap_or(Decimal::ZERO);
        ledger.roll_short_term(year, st_new, st_paid)?;
        ledger.roll_long_term(year, lt_new)?;
    }

    let (years, vintages) = ledger.into_schedule()?;
    let total_principal_paid = years
        .iter()
        .skip(1)
        .map(|y| y.st_principal_paid + y.lt_principal_paid)
        .sum();
    let total_interest = interest.iter().sum();

    let output = DebtScheduleOutput {
        years,
        vintages,
        interest,
        total_principal_paid,
        total_interest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt Ledger (short-term full rollover, long-term straight-line vintages)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
