//! Engine configuration.
//!
//! Defaults match the documented policy values. `from_env` overlays
//! `FOLIO_*` environment variables on top of them.

use std::str::FromStr;
use std::time::Duration;

use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::errors::{Error, Result};

/// Score boundaries for risk classification. A score below `low` is LOW,
/// below `moderate` is MODERATE, below `high` is HIGH, otherwise AGGRESSIVE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskThresholds {
    pub low: Decimal,
    pub moderate: Decimal,
    pub high: Decimal,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: dec!(0.05),
            moderate: dec!(0.10),
            high: dec!(0.15),
        }
    }
}

/// Weights of the classification score
/// `volatility * w_v + beta * w_b + max_drawdown * w_d`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskWeights {
    pub volatility: Decimal,
    pub beta: Decimal,
    pub max_drawdown: Decimal,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            volatility: dec!(0.4),
            beta: dec!(0.3),
            max_drawdown: dec!(0.3),
        }
    }
}

/// Inputs of the risk calculator that are policy rather than data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskConfig {
    /// Number of trailing daily returns to analyse.
    pub lookback_days: u32,
    pub risk_free_rate: Decimal,
    pub weights: RiskWeights,
    pub thresholds: RiskThresholds,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_RISK_LOOKBACK_DAYS,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            weights: RiskWeights::default(),
            thresholds: RiskThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub risk: RiskConfig,
    pub cache_ttl_secs: u64,
    pub refresh_batch_size: usize,
    pub price_fetch_timeout_secs: u64,
    pub default_rebalance_threshold: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk: RiskConfig::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            refresh_batch_size: DEFAULT_REFRESH_BATCH_SIZE,
            price_fetch_timeout_secs: DEFAULT_PRICE_FETCH_TIMEOUT_SECS,
            default_rebalance_threshold: DEFAULT_REBALANCE_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Builds a configuration from the defaults and `FOLIO_*` variables.
    ///
    /// Recognised variables: `FOLIO_RISK_LOOKBACK_DAYS`, `FOLIO_RISK_FREE_RATE`,
    /// `FOLIO_CACHE_TTL_SECS`, `FOLIO_REFRESH_BATCH_SIZE`,
    /// `FOLIO_PRICE_FETCH_TIMEOUT_SECS`, `FOLIO_REBALANCE_THRESHOLD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "FOLIO_RISK_LOOKBACK_DAYS")? {
            config.risk.lookback_days = v;
        }
        if let Some(v) = parse_var(&lookup, "FOLIO_RISK_FREE_RATE")? {
            config.risk.risk_free_rate = v;
        }
        if let Some(v) = parse_var(&lookup, "FOLIO_CACHE_TTL_SECS")? {
            config.cache_ttl_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "FOLIO_REFRESH_BATCH_SIZE")? {
            config.refresh_batch_size = v;
        }
        if let Some(v) = parse_var(&lookup, "FOLIO_PRICE_FETCH_TIMEOUT_SECS")? {
            config.price_fetch_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "FOLIO_REBALANCE_THRESHOLD")? {
            config.default_rebalance_threshold = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.risk.lookback_days < 1 {
            return Err(Error::Config(
                "risk lookback must cover at least one day".to_string(),
            ));
        }
        if self.refresh_batch_size == 0 {
            return Err(Error::Config(
                "refresh batch size must be positive".to_string(),
            ));
        }
        if self.price_fetch_timeout_secs == 0 {
            return Err(Error::Config(
                "price fetch timeout must be positive".to_string(),
            ));
        }
        let t = &self.risk.thresholds;
        if !(t.low < t.moderate && t.moderate < t.high) {
            return Err(Error::Config(format!(
                "risk thresholds must be increasing, got {} / {} / {}",
                t.low, t.moderate, t.high
            )));
        }
        if !(MIN_REBALANCE_THRESHOLD..=MAX_REBALANCE_THRESHOLD)
            .contains(&self.default_rebalance_threshold)
        {
            return Err(Error::Config(format!(
                "default rebalance threshold must be between {} and {}",
                MIN_REBALANCE_THRESHOLD, MAX_REBALANCE_THRESHOLD
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn price_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.price_fetch_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => {
            warn!("{} is set but empty, keeping the default", key);
            Ok(None)
        }
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}='{}': {}", key, raw, e))),
    }
}
