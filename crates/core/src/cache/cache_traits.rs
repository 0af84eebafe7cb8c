//! Contract for the key/value cache collaborator.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// A key/value store with per-entry time-to-live. Values are replaced
/// wholesale on `set`, never mutated in place.
#[async_trait]
pub trait CacheStoreTrait: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}
