//! Holding snapshots and the holdings store contract.

mod holdings_model;
mod holdings_traits;
mod price_history;

pub use holdings_model::*;
pub use holdings_traits::*;
pub use price_history::PriceHistory;
