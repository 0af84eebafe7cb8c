use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::holdings::AssetClass;
use crate::portfolio::allocation::Allocation;

/// Desired percentage per asset class. Must sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAllocation {
    pub stocks: Decimal,
    pub bonds: Decimal,
    pub mutual_funds: Decimal,
    pub etfs: Decimal,
}

impl TargetAllocation {
    pub fn new(stocks: Decimal, bonds: Decimal, mutual_funds: Decimal, etfs: Decimal) -> Self {
        Self {
            stocks,
            bonds,
            mutual_funds,
            etfs,
        }
    }

    pub fn get(&self, asset_class: AssetClass) -> Decimal {
        match asset_class {
            AssetClass::Stock => self.stocks,
            AssetClass::Bond => self.bonds,
            AssetClass::MutualFund => self.mutual_funds,
            AssetClass::Etf => self.etfs,
        }
    }

    pub fn sum(&self) -> Decimal {
        self.stocks + self.bonds + self.mutual_funds + self.etfs
    }

    /// Wire name of the field holding `asset_class`, used in error messages.
    pub fn field_name(asset_class: AssetClass) -> &'static str {
        match asset_class {
            AssetClass::Stock => "targetAllocation.stocks",
            AssetClass::Bond => "targetAllocation.bonds",
            AssetClass::MutualFund => "targetAllocation.mutualFunds",
            AssetClass::Etf => "targetAllocation.etfs",
        }
    }
}

impl From<&Allocation> for TargetAllocation {
    fn from(allocation: &Allocation) -> Self {
        Self::new(
            allocation.stocks,
            allocation.bonds,
            allocation.mutual_funds,
            allocation.etfs,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceAction {
    Buy,
    Sell,
}

/// A trade that brings one asset class back to its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceRecommendation {
    pub asset_class: AssetClass,
    pub action: RebalanceAction,
    /// Value to buy or sell. Always non-negative; `action` carries the direction.
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDeviation {
    pub asset_class: AssetClass,
    pub current_percent: Decimal,
    pub target_percent: Decimal,
    /// `|current - target|` in percentage points.
    pub deviation: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceAnalysis {
    pub required: bool,
    pub threshold: Decimal,
    pub deviations: Vec<AllocationDeviation>,
    pub recommendations: Vec<RebalanceRecommendation>,
}
