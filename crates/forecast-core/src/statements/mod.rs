pub mod balance_sheet;
pub mod cash_budget;
pub mod income;

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Balances carried out of year k-1 that year k's engines are allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningBalances {
    pub cash: Money,
    pub st_investment: Money,
    pub st_debt: Money,
    pub lt_debt: Money,
}

impl OpeningBalances {
    pub fn total_debt(&self) -> Money {
        self.st_debt + self.lt_debt
    }
}
