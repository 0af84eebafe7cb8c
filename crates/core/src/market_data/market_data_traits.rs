//! Contracts for pricing collaborators.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;

/// Current price source, one symbol at a time.
#[async_trait]
pub trait PriceFeedTrait: Send + Sync {
    async fn get_current_price(&self, symbol: &str) -> Result<Decimal>;
}

/// Benchmark daily returns used for beta.
#[async_trait]
pub trait MarketProxySourceTrait: Send + Sync {
    /// The most recent `n` daily returns of the benchmark, oldest first.
    async fn get_market_daily_returns(&self, n: usize) -> Result<Vec<Decimal>>;
}
