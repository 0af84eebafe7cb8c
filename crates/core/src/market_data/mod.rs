//! Price feed and benchmark contracts.

mod market_data_traits;
mod synthetic_market;

pub use market_data_traits::{MarketProxySourceTrait, PriceFeedTrait};
pub use synthetic_market::SyntheticMarketProxy;
