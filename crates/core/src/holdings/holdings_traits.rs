//! Contracts for the holdings store collaborator.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::Holding;
use crate::errors::Result;
use crate::portfolio::{PortfolioChanges, PortfolioSettings};

/// Source of truth for holdings, their price history and per-owner settings.
#[async_trait]
pub trait HoldingsStoreTrait: Send + Sync {
    async fn list_holdings(&self, owner_id: &str) -> Result<Vec<Holding>>;

    /// Target allocation and rebalance threshold for an owner. Owners without
    /// stored settings get `PortfolioSettings::default()`.
    async fn get_settings(&self, owner_id: &str) -> Result<PortfolioSettings>;

    /// Total portfolio value as of `date`, following the nearest-prior-date
    /// policy (see `PriceHistory`). `None` when there is no data at or before
    /// `date`.
    async fn get_historical_value(&self, owner_id: &str, date: NaiveDate)
        -> Result<Option<Decimal>>;

    /// Stages `changes` for an owner and returns the open transaction. Nothing
    /// is visible to other readers until `commit` succeeds.
    async fn mutate_holdings(
        &self,
        owner_id: &str,
        changes: &PortfolioChanges,
    ) -> Result<Box<dyn HoldingsTransaction>>;
}

/// An open, not yet visible, set of holding and settings mutations.
#[async_trait]
pub trait HoldingsTransaction: Send + Sync {
    /// Holdings as they will be after commit.
    fn holdings(&self) -> &[Holding];

    /// Settings as they will be after commit.
    fn settings(&self) -> &PortfolioSettings;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
