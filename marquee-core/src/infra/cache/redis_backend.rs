use std::{fmt, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::{debug, info};

use super::backend::CacheBackend;
use crate::error::{CatalogError, Result};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

/// Scheme, host and port of a connection URL, without credentials or path.
fn redacted_endpoint(redis_url: &str) -> String {
    match url::Url::parse(redis_url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("localhost");
            match parsed.port() {
                Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
                None => format!("{}://{host}", parsed.scheme()),
            }
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self> {
        info!(endpoint = %redacted_endpoint(redis_url), "Connecting to Redis cache");

        let client = redis::Client::open(redis_url).map_err(|e| {
            CatalogError::Cache(format!("Failed to create Redis client: {e}"))
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            CatalogError::Cache(format!("Failed to connect to Redis: {e}"))
        })?;

        info!("Successfully connected to Redis cache");

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!("Cache GET: {}", key);

        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| CatalogError::Cache(format!("Redis GET failed: {e}")))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| CatalogError::Cache(format!("Redis SETEX failed: {e}")))
    }
}
