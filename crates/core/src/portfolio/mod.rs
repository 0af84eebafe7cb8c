//! Portfolio analytics: calculators, rebalancing checks and the orchestrating
//! service.

pub mod allocation;
pub mod performance;
pub mod rebalancing;
pub mod risk;

mod portfolio_model;
mod portfolio_service;


pub use allocation::*;
pub use performance::*;
pub use rebalancing::*;
pub use risk::*;

pub use portfolio_model::*;
pub use portfolio_service::{PortfolioService, PortfolioServiceTrait};
