use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::backend::CacheBackend;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    expires_at: Instant,
}

/// Process-local TTL map used when no Redis URL is configured.
///
/// Writes purge expired entries once the earliest known expiry has passed,
/// so keys that are never read again do not accumulate.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
    next_expiry: Mutex<Option<Instant>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry whose TTL has elapsed.
    pub fn purge_expired(&self) -> usize {
        let mut next_expiry = self.lock_next_expiry();
        self.purge_locked(&mut next_expiry, Instant::now())
    }

    fn lock_next_expiry(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.next_expiry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn purge_locked(&self, next_expiry: &mut Option<Instant>, now: Instant) -> usize {
        let before = self.entries.len();
        let mut earliest: Option<Instant> = None;
        self.entries.retain(|_, entry| {
            let keep = entry.expires_at > now;
            if keep {
                earliest = Some(earliest.map_or(entry.expires_at, |t| t.min(entry.expires_at)));
            }
            keep
        });
        *next_expiry = earliest;
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                return Ok(Some(entry.payload.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if hit {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = now + ttl;

        let mut next_expiry = self.lock_next_expiry();
        if next_expiry.is_some_and(|due| due <= now) {
            let purged = self.purge_locked(&mut next_expiry, now);
            debug!(purged, "purged expired cache entries");
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                payload: value,
                expires_at,
            },
        );
        *next_expiry = Some(next_expiry.map_or(expires_at, |due| due.min(expires_at)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let cache = InMemoryCache::new();
        cache
            .set("short", "a".into(), Duration::from_secs(1))
            .await
            .unwrap();
        cache
            .set("long", "b".into(), Duration::from_secs(100))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unread_expired_entries_are_dropped_on_write() {
        let cache = InMemoryCache::new();
        for i in 0..1000 {
            cache
                .set(&format!("one-off-{i}"), "x".into(), Duration::from_secs(900))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 1000);

        tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
        cache
            .set("fresh", "y".into(), Duration::from_secs(900))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test(start_paused = true)]
    async fn live_entries_survive_a_write_time_purge() {
        let cache = InMemoryCache::new();
        cache
            .set("short", "a".into(), Duration::from_secs(1))
            .await
            .unwrap();
        cache
            .set("long", "b".into(), Duration::from_secs(100))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        cache
            .set("new", "c".into(), Duration::from_secs(100))
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("b"));
    }
}
