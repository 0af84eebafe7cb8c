//! Folio Engine - portfolio valuation and risk analytics.
//!
//! This crate turns an owner's holdings into allocation, performance and risk
//! snapshots, validates rebalancing targets, and caches the results. Storage,
//! pricing and caching backends are reached through the traits defined here.

pub mod cache;
pub mod config;
pub mod constants;
pub mod errors;
pub mod holdings;
pub mod market_data;
pub mod portfolio;
pub mod utils;

pub use cache::*;
pub use config::EngineConfig;
pub use holdings::*;
pub use market_data::*;
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
