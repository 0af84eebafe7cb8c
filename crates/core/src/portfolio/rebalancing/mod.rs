mod rebalancing_model;
mod rebalancing_validator;

pub use rebalancing_model::*;
pub use rebalancing_validator::*;
