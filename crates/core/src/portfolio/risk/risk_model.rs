//! Risk snapshot models.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RiskThresholds;

/// Discrete risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Moderate,
    High,
    Aggressive,
}

impl RiskLevel {
    pub fn from_score(score: Decimal, thresholds: &RiskThresholds) -> Self {
        if score < thresholds.low {
            RiskLevel::Low
        } else if score < thresholds.moderate {
            RiskLevel::Moderate
        } else if score < thresholds.high {
            RiskLevel::High
        } else {
            RiskLevel::Aggressive
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Moderate => write!(f, "MODERATE"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Aggressive => write!(f, "AGGRESSIVE"),
        }
    }
}

/// Risk statistics of a portfolio value series. All figures are unit-less
/// fractions (0.12 is 12%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    /// Annualized sample standard deviation of daily returns.
    pub volatility: Decimal,
    pub beta: Decimal,
    pub sharpe_ratio: Decimal,
    /// One-day historical VaR at 95% confidence, as a positive loss.
    pub value_at_risk: Decimal,
    pub max_drawdown: Decimal,
    pub risk_level: RiskLevel,
    /// Volatility was zero, so `sharpe_ratio` is reported as 0.
    #[serde(default)]
    pub sharpe_undefined: bool,
    /// Number of daily returns the statistics were computed from.
    #[serde(default)]
    pub observations: usize,
    pub calculated_at: DateTime<Utc>,
}

impl RiskMetrics {
    /// Zeroed metrics classified as LOW, used for portfolios without history.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            volatility: Decimal::ZERO,
            beta: Decimal::ZERO,
            sharpe_ratio: Decimal::ZERO,
            value_at_risk: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            risk_level: RiskLevel::Low,
            sharpe_undefined: false,
            observations: 0,
            calculated_at: now,
        }
    }
}
