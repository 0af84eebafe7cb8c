//! Time-boxed memoization of computed analytics.

mod analytics_cache;
mod cache_traits;
mod memory_cache_store;

pub use analytics_cache::*;
pub use cache_traits::CacheStoreTrait;
pub use memory_cache_store::MemoryCacheStore;
