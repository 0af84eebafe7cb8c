//! Volatility, beta, Sharpe ratio, VaR and drawdown from a daily value series.
//!
//! All arithmetic is done in `Decimal` with checked operations, so there is
//! no NaN or infinity to leak; an overflow surfaces as `Error::Computation`.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use num_traits::ToPrimitive;
use rust_decimal::MathematicalOps;
use rust_decimal::Decimal;

use super::{RiskLevel, RiskMetrics};
use crate::config::RiskConfig;
use crate::constants::{
    DECIMAL_PRECISION, SQRT_TRADING_DAYS_APPROX, TRADING_DAYS_PER_YEAR, VAR_TAIL_FRACTION,
};
use crate::errors::{Error, Result};

fn overflow(what: &str) -> Error {
    Error::Computation(format!("decimal overflow while computing {}", what))
}

/// `r_i = (V_i - V_{i-1}) / V_{i-1}` for consecutive values. Pairs whose
/// previous value is zero have no defined return and are skipped.
pub fn daily_returns(values: &[Decimal]) -> Result<Vec<Decimal>> {
    if values.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "need at least 2 daily values, got {}",
            values.len()
        )));
    }

    let mut returns = Vec::with_capacity(values.len() - 1);
    for pair in values.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        if prev.is_zero() {
            warn!("Skipping daily return after a zero portfolio value");
            continue;
        }
        let r = (cur - prev)
            .checked_div(prev)
            .ok_or_else(|| overflow("daily returns"))?;
        returns.push(r);
    }

    if returns.is_empty() {
        return Err(Error::InsufficientData(
            "no daily return could be computed from the value series".to_string(),
        ));
    }
    Ok(returns)
}

fn mean(values: &[Decimal]) -> Result<Decimal> {
    if values.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let mut sum = Decimal::ZERO;
    for value in values {
        sum = sum.checked_add(*value).ok_or_else(|| overflow("mean"))?;
    }
    Ok(sum / Decimal::from(values.len()))
}

/// Sample covariance (n - 1). Zero for fewer than two paired points.
fn sample_covariance(a: &[Decimal], b: &[Decimal]) -> Result<Decimal> {
    let n = a.len().min(b.len());
    if n < 2 {
        return Ok(Decimal::ZERO);
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a)?, mean(b)?);

    let mut sum = Decimal::ZERO;
    for (x, y) in a.iter().zip(b) {
        let term = (*x - mean_a)
            .checked_mul(*y - mean_b)
            .ok_or_else(|| overflow("covariance"))?;
        sum = sum.checked_add(term).ok_or_else(|| overflow("covariance"))?;
    }
    Ok(sum / Decimal::from(n - 1))
}

fn sample_variance(values: &[Decimal]) -> Result<Decimal> {
    sample_covariance(values, values)
}

/// Sample standard deviation of daily returns, annualized by sqrt(252).
pub fn calculate_volatility(returns: &[Decimal]) -> Result<Decimal> {
    let variance = sample_variance(returns)?;
    if variance <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let daily_volatility = variance.sqrt().ok_or_else(|| {
        Error::Computation(format!("square root of variance {} failed", variance))
    })?;
    let annualization_factor = Decimal::from(TRADING_DAYS_PER_YEAR)
        .sqrt()
        .unwrap_or(SQRT_TRADING_DAYS_APPROX);

    daily_volatility
        .checked_mul(annualization_factor)
        .ok_or_else(|| overflow("volatility"))
}

/// `cov(portfolio, market) / var(market)` over the trailing common length.
pub fn calculate_beta(portfolio_returns: &[Decimal], market_returns: &[Decimal]) -> Result<Decimal> {
    let n = portfolio_returns.len().min(market_returns.len());
    if n < 2 {
        return Err(Error::InsufficientData(format!(
            "beta needs at least 2 paired returns, got {}",
            n
        )));
    }
    let p = &portfolio_returns[portfolio_returns.len() - n..];
    let m = &market_returns[market_returns.len() - n..];

    let market_variance = sample_variance(m)?;
    if market_variance.is_zero() {
        return Err(Error::InsufficientData(
            "market return series has zero variance".to_string(),
        ));
    }

    sample_covariance(p, m)?
        .checked_div(market_variance)
        .ok_or_else(|| overflow("beta"))
}

/// Historical one-day VaR at 95%: the negated 5th-percentile daily return.
pub fn calculate_value_at_risk(returns: &[Decimal]) -> Decimal {
    if returns.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = returns.to_vec();
    sorted.sort();

    let index = (VAR_TAIL_FRACTION * Decimal::from(sorted.len()))
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(sorted.len() - 1);
    -sorted[index]
}

/// Largest peak-to-trough decline of the compounded return curve, starting
/// at 1.0. Never negative.
pub fn calculate_max_drawdown(returns: &[Decimal]) -> Result<Decimal> {
    let mut cumulative_value = Decimal::ONE;
    let mut peak_value = Decimal::ONE;
    let mut max_drawdown = Decimal::ZERO;

    for &daily_return in returns {
        cumulative_value = cumulative_value
            .checked_mul(Decimal::ONE + daily_return)
            .ok_or_else(|| overflow("max drawdown"))?;
        peak_value = peak_value.max(cumulative_value);
        if peak_value <= Decimal::ZERO {
            max_drawdown = max_drawdown.max(Decimal::ONE);
        } else {
            let drawdown = (peak_value - cumulative_value) / peak_value;
            max_drawdown = max_drawdown.max(drawdown);
        }
    }

    Ok(max_drawdown.max(Decimal::ZERO))
}

/// Computes the risk snapshot of a daily portfolio value series.
///
/// `values` is oldest first. `market_returns` is the benchmark's daily return
/// series, aligned with the portfolio returns on their trailing end.
///
/// Fails with `InsufficientData` for fewer than two values or a flat market
/// series.
pub fn calculate_risk_metrics(
    values: &[Decimal],
    market_returns: &[Decimal],
    config: &RiskConfig,
    now: DateTime<Utc>,
) -> Result<RiskMetrics> {
    let returns = daily_returns(values)?;
    debug!(
        "Computing risk metrics from {} daily returns against {} market returns",
        returns.len(),
        market_returns.len()
    );

    let volatility = calculate_volatility(&returns)?;
    let beta = calculate_beta(&returns, market_returns)?;

    let (sharpe_ratio, sharpe_undefined) = if volatility.is_zero() {
        (Decimal::ZERO, true)
    } else {
        let excess = mean(&returns)?
            .checked_sub(config.risk_free_rate)
            .ok_or_else(|| overflow("excess return"))?;
        let sharpe = excess
            .checked_div(volatility)
            .ok_or_else(|| overflow("sharpe ratio"))?;
        (sharpe, false)
    };

    let value_at_risk = calculate_value_at_risk(&returns);
    let max_drawdown = calculate_max_drawdown(&returns)?;

    let w = &config.weights;
    let score = [
        (w.volatility, volatility),
        (w.beta, beta),
        (w.max_drawdown, max_drawdown),
    ]
    .iter()
    .try_fold(Decimal::ZERO, |acc, (weight, value)| {
        weight.checked_mul(*value).and_then(|term| acc.checked_add(term))
    })
    .ok_or_else(|| overflow("risk score"))?;
    let risk_level = RiskLevel::from_score(score, &config.thresholds);

    Ok(RiskMetrics {
        volatility: volatility.round_dp(DECIMAL_PRECISION),
        beta: beta.round_dp(DECIMAL_PRECISION),
        sharpe_ratio: sharpe_ratio.round_dp(DECIMAL_PRECISION),
        value_at_risk: value_at_risk.round_dp(DECIMAL_PRECISION),
        max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
        risk_level,
        sharpe_undefined,
        observations: returns.len(),
        calculated_at: now,
    })
}
