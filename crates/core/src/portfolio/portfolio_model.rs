//! Portfolio aggregate, change sets and refresh reports.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::holdings::{Holding, HoldingsDelta};
use crate::portfolio::allocation::Allocation;
use crate::portfolio::performance::Performance;
use crate::portfolio::rebalancing::{
    validate_rebalance_threshold, validate_target_allocation, RebalanceAnalysis, TargetAllocation,
};
use crate::portfolio::risk::RiskMetrics;

/// Per-owner rebalancing preferences stored next to the holdings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSettings {
    #[serde(default)]
    pub target_allocation: Option<TargetAllocation>,
    #[serde(default)]
    pub rebalance_threshold: Option<Decimal>,
}

impl PortfolioSettings {
    /// Settings after applying the non-empty fields of `changes`.
    pub fn merged_with(&self, changes: &PortfolioChanges) -> Self {
        Self {
            target_allocation: changes
                .target_allocation
                .clone()
                .or_else(|| self.target_allocation.clone()),
            rebalance_threshold: changes.rebalance_threshold.or(self.rebalance_threshold),
        }
    }
}

/// Input of `update_portfolio`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioChanges {
    #[serde(default)]
    pub holdings_delta: Option<HoldingsDelta>,
    #[serde(default)]
    pub target_allocation: Option<TargetAllocation>,
    #[serde(default)]
    pub rebalance_threshold: Option<Decimal>,
}

impl PortfolioChanges {
    pub fn holdings(delta: HoldingsDelta) -> Self {
        Self {
            holdings_delta: Some(delta),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.holdings_delta.as_ref().map_or(true, |d| d.is_empty())
            && self.target_allocation.is_none()
            && self.rebalance_threshold.is_none()
    }

    /// Validates the whole change set. Runs before anything is mutated.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if let Some(delta) = &self.holdings_delta {
            delta.validate(now)?;
        }
        if let Some(target) = &self.target_allocation {
            validate_target_allocation(target)?;
        }
        if let Some(threshold) = self.rebalance_threshold {
            validate_rebalance_threshold(threshold)?;
        }
        Ok(())
    }
}

/// Aggregate analytics view of one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub owner_id: String,
    pub holdings: Vec<Holding>,
    pub allocation: Allocation,
    pub performance: Performance,
    pub risk: RiskMetrics,
    /// False when there was not enough history for risk statistics and
    /// `risk` holds the zeroed LOW default.
    #[serde(default)]
    pub risk_available: bool,
    pub target_allocation: Option<TargetAllocation>,
    pub rebalance_threshold: Decimal,
    pub rebalance: Option<RebalanceAnalysis>,
    pub last_updated: DateTime<Utc>,
}

impl Portfolio {
    /// Well-defined view of an owner without holdings.
    pub fn empty(
        owner_id: &str,
        settings: &PortfolioSettings,
        rebalance_threshold: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            holdings: Vec::new(),
            allocation: Allocation::default(),
            performance: Performance::empty(now),
            risk: RiskMetrics::empty(now),
            risk_available: false,
            target_allocation: settings.target_allocation.clone(),
            rebalance_threshold,
            rebalance: None,
            last_updated: now,
        }
    }
}

/// A holding whose price could not be refreshed. Its stale price is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRefreshFailure {
    pub holding_id: String,
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a price refresh. Failures are warnings, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub owner_id: String,
    pub attempted: usize,
    pub updated: usize,
    pub batches: usize,
    pub failures: Vec<PriceRefreshFailure>,
    /// Whether analytics were recomputed after the new prices were stored.
    pub recomputed: bool,
    pub refreshed_at: DateTime<Utc>,
}

impl RefreshReport {
    /// True when at least one holding kept its stale price.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failed_symbols(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.symbol.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, ValidationError};
    use rust_decimal_macros::dec;

    #[test]
    fn settings_merge_keeps_unchanged_fields() {
        let current = PortfolioSettings {
            target_allocation: Some(TargetAllocation::new(dec!(70), dec!(20), dec!(5), dec!(5))),
            rebalance_threshold: Some(dec!(5)),
        };
        let changes = PortfolioChanges {
            rebalance_threshold: Some(dec!(10)),
            ..PortfolioChanges::default()
        };

        let merged = current.merged_with(&changes);
        assert_eq!(merged.target_allocation, current.target_allocation);
        assert_eq!(merged.rebalance_threshold, Some(dec!(10)));
    }

    #[test]
    fn changes_validation_covers_every_part() {
        let now = Utc::now();
        let bad_threshold = PortfolioChanges {
            rebalance_threshold: Some(dec!(25)),
            ..PortfolioChanges::default()
        };
        assert!(matches!(
            bad_threshold.validate(now),
            Err(Error::Validation(ValidationError::OutOfRange { .. }))
        ));

        let bad_target = PortfolioChanges {
            target_allocation: Some(TargetAllocation::new(dec!(80), dec!(30), dec!(5), dec!(5))),
            ..PortfolioChanges::default()
        };
        assert!(matches!(
            bad_target.validate(now),
            Err(Error::Validation(ValidationError::AllocationSum { .. }))
        ));

        assert!(PortfolioChanges::default().is_empty());
        assert!(PortfolioChanges::default().validate(now).is_ok());
    }

    #[test]
    fn report_lists_failed_symbols() {
        let report = RefreshReport {
            owner_id: "o".to_string(),
            attempted: 2,
            updated: 1,
            batches: 1,
            failures: vec![PriceRefreshFailure {
                holding_id: "h2".to_string(),
                symbol: "BAD".to_string(),
                reason: "timeout".to_string(),
            }],
            recomputed: true,
            refreshed_at: Utc::now(),
        };
        assert!(report.is_partial());
        assert_eq!(report.failed_symbols(), vec!["BAD"]);
    }
}
