use std::{fmt, time::Duration};

use async_trait::async_trait;

use crate::error::Result;

/// Key/value store holding serialized listing payloads.
#[async_trait]
pub trait CacheBackend: Send + Sync + fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}
