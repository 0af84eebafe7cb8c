//! Allocation by asset class.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::holdings::AssetClass;

/// Percentage (0-100) of total current value held in each asset class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub stocks: Decimal,
    pub bonds: Decimal,
    pub mutual_funds: Decimal,
    pub etfs: Decimal,
}

impl Allocation {
    pub fn get(&self, asset_class: AssetClass) -> Decimal {
        match asset_class {
            AssetClass::Stock => self.stocks,
            AssetClass::Bond => self.bonds,
            AssetClass::MutualFund => self.mutual_funds,
            AssetClass::Etf => self.etfs,
        }
    }

    pub fn get_mut(&mut self, asset_class: AssetClass) -> &mut Decimal {
        match asset_class {
            AssetClass::Stock => &mut self.stocks,
            AssetClass::Bond => &mut self.bonds,
            AssetClass::MutualFund => &mut self.mutual_funds,
            AssetClass::Etf => &mut self.etfs,
        }
    }

    pub fn sum(&self) -> Decimal {
        self.stocks + self.bonds + self.mutual_funds + self.etfs
    }

    pub fn is_zero(&self) -> bool {
        AssetClass::ALL.iter().all(|c| self.get(*c).is_zero())
    }
}
