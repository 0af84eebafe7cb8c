use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;

use crate::cache::{AnalyticsCache, CacheStoreTrait, MetricKind};
use crate::config::EngineConfig;
use crate::errors::{Error, InvalidInputError, Result, ValidationError};
use crate::holdings::{Holding, HoldingUpdate, HoldingsDelta, HoldingsStoreTrait};
use crate::market_data::{MarketProxySourceTrait, PriceFeedTrait};
use crate::portfolio::allocation::{calculate_allocation, Allocation};
use crate::portfolio::performance::{
    calculate_performance, Performance, ReturnWindow, WindowValues,
};
use crate::portfolio::rebalancing::{analyze_rebalance, RebalanceAnalysis};
use crate::portfolio::risk::{calculate_risk_metrics, RiskMetrics};
use crate::utils::time_utils;

use super::{
    Portfolio, PortfolioChanges, PortfolioSettings, PriceRefreshFailure, RefreshReport,
};

#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    /// Full analytics view of an owner, served from cache when fresh.
    ///
    /// An owner without holdings gets `Portfolio::empty`. Missing risk
    /// history degrades to LOW risk with `risk_available = false`.
    async fn get_portfolio(&self, owner_id: &str) -> Result<Portfolio>;

    async fn get_allocation(&self, owner_id: &str) -> Result<Allocation>;

    async fn get_performance(&self, owner_id: &str) -> Result<Performance>;

    /// Fails with `InsufficientData` when fewer than two daily values exist.
    async fn get_risk_metrics(&self, owner_id: &str) -> Result<RiskMetrics>;

    /// Rebalance analysis against the stored target, if one is set.
    async fn get_rebalance_analysis(&self, owner_id: &str) -> Result<Option<RebalanceAnalysis>>;

    /// Fetches new prices for every holding in sequential batches of
    /// concurrent requests. Individual failures keep the stale price and are
    /// reported in the returned `RefreshReport`.
    async fn refresh_prices(&self, owner_id: &str) -> Result<RefreshReport>;

    /// Applies `changes` and recomputes analytics as one unit. Validation
    /// runs first; on any failure nothing is committed and nothing is cached.
    async fn update_portfolio(&self, owner_id: &str, changes: PortfolioChanges)
        -> Result<Portfolio>;
}

pub struct PortfolioService {
    holdings_store: Arc<dyn HoldingsStoreTrait>,
    price_feed: Arc<dyn PriceFeedTrait>,
    market_proxy: Arc<dyn MarketProxySourceTrait>,
    cache: AnalyticsCache,
    config: EngineConfig,
}

impl PortfolioService {
    pub fn new(
        holdings_store: Arc<dyn HoldingsStoreTrait>,
        price_feed: Arc<dyn PriceFeedTrait>,
        market_proxy: Arc<dyn MarketProxySourceTrait>,
        cache_store: Arc<dyn CacheStoreTrait>,
        config: EngineConfig,
    ) -> Self {
        let cache = AnalyticsCache::new(cache_store, config.cache_ttl());
        Self {
            holdings_store,
            price_feed,
            market_proxy,
            cache,
            config,
        }
    }

    fn threshold_for(&self, settings: &PortfolioSettings) -> Decimal {
        settings
            .rebalance_threshold
            .unwrap_or(self.config.default_rebalance_threshold)
    }

    /// Portfolio value at the start of every return window.
    async fn load_window_values(&self, owner_id: &str, now: DateTime<Utc>) -> Result<WindowValues> {
        let lookups = ReturnWindow::ALL.iter().map(|window| async move {
            let value = self
                .holdings_store
                .get_historical_value(owner_id, window.start_date(now))
                .await?;
            Ok::<_, Error>((*window, value))
        });
        Ok(try_join_all(lookups).await?.into_iter().collect())
    }

    /// Daily portfolio values over the risk look-back, oldest first. Days
    /// without data are skipped.
    async fn load_value_series(&self, owner_id: &str, now: DateTime<Utc>) -> Result<Vec<Decimal>> {
        let dates = time_utils::trailing_days(
            time_utils::valuation_date(now),
            self.config.risk.lookback_days,
        );
        let lookups = dates
            .iter()
            .map(|date| self.holdings_store.get_historical_value(owner_id, *date));
        let values = try_join_all(lookups).await?;
        Ok(values.into_iter().flatten().collect())
    }

    async fn compute_risk(&self, owner_id: &str, now: DateTime<Utc>) -> Result<RiskMetrics> {
        let values = self.load_value_series(owner_id, now).await?;
        if values.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "owner {} has {} daily values in the last {} days",
                owner_id,
                values.len(),
                self.config.risk.lookback_days
            )));
        }
        let market_returns = self
            .market_proxy
            .get_market_daily_returns(values.len() - 1)
            .await?;
        calculate_risk_metrics(&values, &market_returns, &self.config.risk, now)
    }

    /// Computes the full view from an explicit holding set and settings.
    async fn build_portfolio(
        &self,
        owner_id: &str,
        holdings: &[Holding],
        settings: &PortfolioSettings,
        now: DateTime<Utc>,
    ) -> Result<Portfolio> {
        let threshold = self.threshold_for(settings);
        if holdings.is_empty() {
            debug!("Owner {} has no holdings, returning empty portfolio", owner_id);
            return Ok(Portfolio::empty(owner_id, settings, threshold, now));
        }

        for holding in holdings {
            holding.validate(now)?;
        }

        let allocation = calculate_allocation(holdings)?;
        let window_values = self.load_window_values(owner_id, now).await?;
        let performance = calculate_performance(holdings, &window_values, now)?;

        let (risk, risk_available) = match self.compute_risk(owner_id, now).await {
            Ok(risk) => (risk, true),
            Err(Error::InsufficientData(reason)) => {
                warn!(
                    "Risk metrics unavailable for {}: {}. Reporting LOW risk.",
                    owner_id, reason
                );
                (RiskMetrics::empty(now), false)
            }
            Err(e) => return Err(e),
        };

        let rebalance = match &settings.target_allocation {
            Some(target) => Some(analyze_rebalance(
                &allocation,
                target,
                threshold,
                performance.total_value,
            )?),
            None => None,
        };

        Ok(Portfolio {
            owner_id: owner_id.to_string(),
            holdings: holdings.to_vec(),
            allocation,
            performance,
            risk,
            risk_available,
            target_allocation: settings.target_allocation.clone(),
            rebalance_threshold: threshold,
            rebalance,
            last_updated: now,
        })
    }

    async fn compute_portfolio(&self, owner_id: &str, now: DateTime<Utc>) -> Result<Portfolio> {
        let holdings = self.holdings_store.list_holdings(owner_id).await?;
        let settings = self.holdings_store.get_settings(owner_id).await?;
        self.build_portfolio(owner_id, &holdings, &settings, now)
            .await
    }

    /// Writes the aggregate and each single-metric snapshot to the cache.
    async fn store_snapshots(&self, portfolio: &Portfolio) {
        let owner_id = portfolio.owner_id.as_str();
        self.cache
            .put(owner_id, MetricKind::Portfolio, portfolio)
            .await;
        self.cache
            .put(owner_id, MetricKind::Allocation, &portfolio.allocation)
            .await;
        self.cache
            .put(owner_id, MetricKind::Performance, &portfolio.performance)
            .await;
        if portfolio.risk_available {
            self.cache
                .put(owner_id, MetricKind::Risk, &portfolio.risk)
                .await;
        }
    }

    /// Stores refreshed prices in one transaction and returns how many were
    /// written. Holdings deleted since they were listed are dropped from the
    /// write and reported as failures instead of failing the whole refresh.
    async fn write_prices(
        &self,
        owner_id: &str,
        mut updates: Vec<HoldingUpdate>,
        holdings: &[Holding],
        failures: &mut Vec<PriceRefreshFailure>,
    ) -> Result<usize> {
        while !updates.is_empty() {
            let changes = PortfolioChanges::holdings(HoldingsDelta {
                update: updates.clone(),
                ..HoldingsDelta::default()
            });
            match self.holdings_store.mutate_holdings(owner_id, &changes).await {
                Ok(transaction) => {
                    transaction.commit().await?;
                    return Ok(updates.len());
                }
                Err(Error::Validation(ValidationError::UnknownHolding(id))) => {
                    let before = updates.len();
                    updates.retain(|u| u.id != id);
                    if updates.len() == before {
                        return Err(ValidationError::UnknownHolding(id).into());
                    }
                    warn!(
                        "Holding {} of owner {} was removed during refresh, dropping its price",
                        id, owner_id
                    );
                    let symbol = holdings
                        .iter()
                        .find(|h| h.id == id)
                        .map(|h| h.symbol.clone())
                        .unwrap_or_default();
                    failures.push(PriceRefreshFailure {
                        holding_id: id,
                        symbol,
                        reason: "holding no longer exists".to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(0)
    }

    async fn fetch_price(&self, holding: &Holding) -> Result<Decimal> {
        let timeout = self.config.price_fetch_timeout();
        let price = tokio::time::timeout(
            timeout,
            self.price_feed.get_current_price(&holding.symbol),
        )
        .await
        .map_err(|_| {
            Error::PriceFeed(format!(
                "price request for {} timed out after {:?}",
                holding.symbol, timeout
            ))
        })??;

        if price <= Decimal::ZERO {
            return Err(InvalidInputError::NonPositive {
                holding_id: holding.id.clone(),
                field: "currentPrice",
                value: price,
            }
            .into());
        }
        Ok(price)
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn get_portfolio(&self, owner_id: &str) -> Result<Portfolio> {
        if let Some(cached) = self
            .cache
            .get::<Portfolio>(owner_id, MetricKind::Portfolio)
            .await
        {
            debug!("Serving cached portfolio for {}", owner_id);
            return Ok(cached);
        }

        let portfolio = self.compute_portfolio(owner_id, Utc::now()).await?;
        self.store_snapshots(&portfolio).await;
        Ok(portfolio)
    }

    async fn get_allocation(&self, owner_id: &str) -> Result<Allocation> {
        self.cache
            .get_or_compute(owner_id, MetricKind::Allocation, || async move {
                let holdings = self.holdings_store.list_holdings(owner_id).await?;
                calculate_allocation(&holdings)
            })
            .await
    }

    async fn get_performance(&self, owner_id: &str) -> Result<Performance> {
        self.cache
            .get_or_compute(owner_id, MetricKind::Performance, || async move {
                let now = Utc::now();
                let holdings = self.holdings_store.list_holdings(owner_id).await?;
                if holdings.is_empty() {
                    return Ok(Performance::empty(now));
                }
                let window_values = self.load_window_values(owner_id, now).await?;
                calculate_performance(&holdings, &window_values, now)
            })
            .await
    }

    async fn get_risk_metrics(&self, owner_id: &str) -> Result<RiskMetrics> {
        self.cache
            .get_or_compute(owner_id, MetricKind::Risk, || {
                self.compute_risk(owner_id, Utc::now())
            })
            .await
    }

    async fn get_rebalance_analysis(&self, owner_id: &str) -> Result<Option<RebalanceAnalysis>> {
        Ok(self.get_portfolio(owner_id).await?.rebalance)
    }

    async fn refresh_prices(&self, owner_id: &str) -> Result<RefreshReport> {
        let started = Instant::now();
        let holdings = self.holdings_store.list_holdings(owner_id).await?;
        let batch_size = self.config.refresh_batch_size.max(1);

        let mut updates: Vec<HoldingUpdate> = Vec::with_capacity(holdings.len());
        let mut failures: Vec<PriceRefreshFailure> = Vec::new();
        let mut batches = 0;

        for batch in holdings.chunks(batch_size) {
            batches += 1;
            let results = join_all(batch.iter().map(|h| self.fetch_price(h))).await;

            for (holding, result) in batch.iter().zip(results) {
                match result {
                    Ok(price) => updates.push(HoldingUpdate::price(holding.id.clone(), price)),
                    Err(e) => {
                        warn!(
                            "Price refresh failed for {} ({}) of owner {}: {}. Keeping stale price.",
                            holding.symbol, holding.id, owner_id, e
                        );
                        failures.push(PriceRefreshFailure {
                            holding_id: holding.id.clone(),
                            symbol: holding.symbol.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        let updated = self
            .write_prices(owner_id, updates, &holdings, &mut failures)
            .await?;

        self.cache.invalidate_owner(owner_id).await;

        let recomputed = match self.compute_portfolio(owner_id, Utc::now()).await {
            Ok(portfolio) => {
                self.store_snapshots(&portfolio).await;
                true
            }
            Err(e) => {
                warn!("Recomputing analytics for {} after refresh failed: {}", owner_id, e);
                false
            }
        };

        info!(
            "Refreshed {}/{} prices for {} in {} batches ({:?})",
            updated,
            holdings.len(),
            owner_id,
            batches,
            started.elapsed()
        );

        Ok(RefreshReport {
            owner_id: owner_id.to_string(),
            attempted: holdings.len(),
            updated,
            batches,
            failures,
            recomputed,
            refreshed_at: Utc::now(),
        })
    }

    async fn update_portfolio(
        &self,
        owner_id: &str,
        changes: PortfolioChanges,
    ) -> Result<Portfolio> {
        let now = Utc::now();
        changes.validate(now)?;

        let transaction = self
            .holdings_store
            .mutate_holdings(owner_id, &changes)
            .await?;

        let built = self
            .build_portfolio(owner_id, transaction.holdings(), transaction.settings(), now)
            .await;

        let portfolio = match built {
            Ok(portfolio) => portfolio,
            Err(e) => {
                warn!(
                    "Rolling back portfolio update for {}: recompute failed: {}",
                    owner_id, e
                );
                if let Err(rollback_err) = transaction.rollback().await {
                    error!("Rollback failed for {}: {}", owner_id, rollback_err);
                }
                return Err(e);
            }
        };

        transaction.commit().await?;

        self.cache.invalidate_owner(owner_id).await;
        self.store_snapshots(&portfolio).await;
        debug!("Committed portfolio update for {}", owner_id);
        Ok(portfolio)
    }
}
