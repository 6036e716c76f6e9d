use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arena::YearSlots;
use crate::drivers::ForecastDrivers;
use crate::fundamentals::YearZeroFundamentals;
use crate::types::{LineItemMap, LineItems, Money, Rate};
use crate::ForecastResult;

/// Operating drivers for one year, before any financing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedYear {
    pub year: usize,
    pub revenue_growth: Rate,
    pub revenue: Money,
    pub cogs: Money,
    pub gross_profit: Money,
    pub sga: Money,
    pub capex: Money,
    pub gross_ppe: Money,
    pub depreciation: Money,
    pub accumulated_depreciation: Money,
    pub net_ppe: Money,
    pub goodwill: Money,
    pub intangibles_amortization: Money,
    pub intangibles: Money,
    pub accounts_receivable: Money,
    pub inventory: Money,
    pub accounts_payable: Money,
    pub change_in_receivables: Money,
    pub change_in_inventory: Money,
    pub change_in_payables: Money,
    pub change_in_working_capital: Money,
    pub min_cash_required: Money,
    pub cost_of_debt: Rate,
    pub st_investment_return: Rate,
}

impl LineItems for ProjectedYear {
    fn line_items(&self) -> LineItemMap {
        vec![
            ("revenue", self.revenue),
            ("cogs", self.cogs),
            ("gross_profit", self.gross_profit),
            ("sga", self.sga),
            ("capex", self.capex),
            ("gross_ppe", self.gross_ppe),
            ("depreciation", self.depreciation),
            ("accumulated_depreciation", self.accumulated_depreciation),
            ("net_ppe", self.net_ppe),
            ("goodwill", self.goodwill),
            ("intangibles_amortization", self.intangibles_amortization),
            ("intangibles", self.intangibles),
            ("accounts_receivable", self.accounts_receivable),
            ("inventory", self.inventory),
            ("accounts_payable", self.accounts_payable),
            ("change_in_working_capital", self.change_in_working_capital),
            ("min_cash_required", self.min_cash_required),
            ("cost_of_debt", self.cost_of_debt),
            ("st_investment_return", self.st_investment_return),
        ]
    }
}

/// Applies the drivers year by year to the operating line items.
pub struct IntermediateProjector<'a> {
    fundamentals: &'a YearZeroFundamentals,
    drivers: &'a ForecastDrivers,
}

impl<'a> IntermediateProjector<'a> {
    pub fn new(fundamentals: &'a YearZeroFundamentals, drivers: &'a ForecastDrivers) -> Self {
        IntermediateProjector {
            fundamentals,
            drivers,
        }
    }

    /// Year 0 as reported.
    pub fn seed(&self) -> ProjectedYear {
        let f = self.fundamentals;
        ProjectedYear {
            year: 0,
            revenue_growth: Decimal::ZERO,
            revenue: f.revenue,
            cogs: f.cogs,
            gross_profit: f.revenue - f.cogs,
            sga: f.sga,
            capex: f.capex,
            gross_ppe: f.gross_ppe,
            depreciation: f.depreciation,
            accumulated_depreciation: f.accumulated_depreciation,
            net_ppe: f.net_ppe,
            goodwill: f.goodwill,
            intangibles_amortization: Decimal::ZERO,
            intangibles: f.intangibles,
            accounts_receivable: f.accounts_receivable,
            inventory: f.inventory,
            accounts_payable: f.accounts_payable,
            change_in_receivables: Decimal::ZERO,
            change_in_inventory: Decimal::ZERO,
            change_in_payables: Decimal::ZERO,
            change_in_working_capital: Decimal::ZERO,
            min_cash_required: f.revenue * self.drivers.min_cash_pct,
            cost_of_debt: Decimal::ZERO,
            st_investment_return: Decimal::ZERO,
        }
    }

    /// Year `year` from the prior year's projection.
    pub fn project_year(&self, year: usize, prior: &ProjectedYear) -> ProjectedYear {
        let d = self.drivers;

        // 1. Revenue
        let revenue_growth = d.growth(year);
        let revenue = prior.revenue * (Decimal::ONE + revenue_growth);

        // 2-3. Costs
        let cogs = revenue * d.cogs_pct;
        let gross_profit = revenue - cogs;
        let sga = revenue * d.sga_pct;

        // 4-6. Fixed assets, depreciation on the opening balance
        let capex = revenue * d.capex_pct;
        let gross_ppe = prior.gross_ppe + capex;
        let depreciation = prior.net_ppe * d.depreciation_rate;
        let net_ppe = prior.net_ppe + capex - depreciation;
        let accumulated_depreciation = prior.accumulated_depreciation + depreciation;

        let intangibles_amortization = prior.intangibles * d.intangibles_amortization_rate;
        let intangibles = prior.intangibles - intangibles_amortization;

        // 7-8. Working capital
        let accounts_receivable = revenue * d.ar_pct;
        let inventory = cogs * d.inventory_pct;
        let accounts_payable = cogs * d.ap_pct;
        let change_in_receivables = accounts_receivable - prior.accounts_receivable;
        let change_in_inventory = inventory - prior.inventory;
        let change_in_payables = accounts_payable - prior.accounts_payable;
        let change_in_working_capital =
            change_in_receivables + change_in_inventory - change_in_payables;

        // 9. Cash floor
        let min_cash_required = revenue * d.min_cash_pct;

        ProjectedYear {
            year,
            revenue_growth,
            revenue,
            cogs,
            gross_profit,
            sga,
            capex,
            gross_ppe,
            depreciation,
            accumulated_depreciation,
            net_ppe,
            goodwill: prior.goodwill,
            intangibles_amortization,
            intangibles,
            accounts_receivable,
            inventory,
            accounts_payable,
            change_in_receivables,
            change_in_inventory,
            change_in_payables,
            change_in_working_capital,
            min_cash_required,
            cost_of_debt: d.cost_of_debt_for(year),
            st_investment_return: d.st_return_for(year),
        }
    }

    /// Every year from 0 to the drivers' horizon.
    pub fn project(&self) -> ForecastResult<YearSlots<ProjectedYear>> {
        let horizon = self.drivers.horizon;
        let mut slots = YearSlots::new("projection", horizon);
        slots.finalize(0, self.seed())?;
        for year in 1..=horizon {
            let next = self.project_year(year, slots.read_for(year, year - 1)?);
            debug!(year, revenue = %next.revenue, net_ppe = %next.net_ppe, "projected");
            slots.finalize(year, next)?;
        }
        Ok(slots)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
