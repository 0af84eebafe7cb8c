//! Deterministic benchmark series for environments without a real index feed.

use async_trait::async_trait;
use log::debug;
use num_traits::FromPrimitive;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rust_decimal::Decimal;

use super::MarketProxySourceTrait;
use crate::constants::DECIMAL_PRECISION;
use crate::errors::{Error, Result};

const DEFAULT_DAILY_MEAN: f64 = 0.0004;
const DEFAULT_DAILY_STD_DEV: f64 = 0.01;

/// Normally distributed daily returns drawn from a fixed seed. The same
/// `(seed, n)` always yields the same series.
#[derive(Debug, Clone)]
pub struct SyntheticMarketProxy {
    seed: u64,
    mean: f64,
    std_dev: f64,
}

impl SyntheticMarketProxy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            mean: DEFAULT_DAILY_MEAN,
            std_dev: DEFAULT_DAILY_STD_DEV,
        }
    }

    pub fn with_distribution(seed: u64, mean: f64, std_dev: f64) -> Self {
        Self { seed, mean, std_dev }
    }

    pub fn generate(&self, n: usize) -> Result<Vec<Decimal>> {
        let normal = Normal::new(self.mean, self.std_dev)
            .map_err(|e| Error::Config(format!("synthetic market distribution: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..n)
            .map(|_| {
                let sample = normal.sample(&mut rng);
                Decimal::from_f64(sample)
                    .map(|d| d.round_dp(DECIMAL_PRECISION))
                    .ok_or_else(|| {
                        Error::Computation(format!("non-finite synthetic return {}", sample))
                    })
            })
            .collect()
    }
}

impl Default for SyntheticMarketProxy {
    fn default() -> Self {
        Self::new(42)
    }
}

#[async_trait]
impl MarketProxySourceTrait for SyntheticMarketProxy {
    async fn get_market_daily_returns(&self, n: usize) -> Result<Vec<Decimal>> {
        debug!("Generating {} synthetic market returns (seed {})", n, self.seed);
        self.generate(n)
    }
}
