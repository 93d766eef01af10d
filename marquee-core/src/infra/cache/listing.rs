use std::{fmt, future::Future, sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::{
    backend::CacheBackend,
    keys::{CacheKeys, QueryParams},
    memory::InMemoryCache,
};
use crate::error::Result;

/// Listing operations that are served through the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachedOperation {
    Movies,
    MovieFilter,
    Trending,
    Showtimes,
    Cinemas,
    Actors,
    Genres,
    OnlineCinemas,
}

impl CachedOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CachedOperation::Movies => "movies",
            CachedOperation::MovieFilter => "movie_filter",
            CachedOperation::Trending => "trending",
            CachedOperation::Showtimes => "showtimes",
            CachedOperation::Cinemas => "cinemas",
            CachedOperation::Actors => "actors",
            CachedOperation::Genres => "genres",
            CachedOperation::OnlineCinemas => "online_cinemas",
        }
    }
}

impl fmt::Display for CachedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-operation time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub movies: Duration,
    pub movie_filter: Duration,
    pub trending: Duration,
    pub showtimes: Duration,
    pub cinemas: Duration,
    pub actors: Duration,
    pub genres: Duration,
    pub online_cinemas: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        const QUARTER_HOUR: Duration = Duration::from_secs(15 * 60);
        const HALF_HOUR: Duration = Duration::from_secs(30 * 60);
        const HOUR: Duration = Duration::from_secs(60 * 60);
        Self {
            movies: QUARTER_HOUR,
            movie_filter: QUARTER_HOUR,
            trending: HALF_HOUR,
            showtimes: QUARTER_HOUR,
            cinemas: HOUR,
            actors: HOUR,
            genres: HOUR,
            online_cinemas: HOUR,
        }
    }
}

impl CacheTtls {
    pub fn ttl_for(&self, operation: CachedOperation) -> Duration {
        match operation {
            CachedOperation::Movies => self.movies,
            CachedOperation::MovieFilter => self.movie_filter,
            CachedOperation::Trending => self.trending,
            CachedOperation::Showtimes => self.showtimes,
            CachedOperation::Cinemas => self.cinemas,
            CachedOperation::Actors => self.actors,
            CachedOperation::Genres => self.genres,
            CachedOperation::OnlineCinemas => self.online_cinemas,
        }
    }
}

/// Read-through cache in front of listing queries.
///
/// Writes never invalidate entries: a listing may lag a write by up to the
/// operation's TTL. Backend failures degrade to an uncached fetch.
#[derive(Clone)]
pub struct ListingCache {
    backend: Arc<dyn CacheBackend>,
    ttls: CacheTtls,
}

impl fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingCache")
            .field("backend", &self.backend)
            .field("ttls", &self.ttls)
            .finish()
    }
}

impl ListingCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttls: CacheTtls) -> Self {
        Self { backend, ttls }
    }

    pub fn in_memory(ttls: CacheTtls) -> Self {
        Self::new(Arc::new(InMemoryCache::new()), ttls)
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        operation: CachedOperation,
        params: &QueryParams,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = CacheKeys::listing(operation.as_str(), params);

        match self.backend.get(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                Ok(value) => {
                    debug!(%operation, %key, "cache hit");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(%operation, %key, error = %err, "discarding undecodable cache entry");
                }
            },
            Ok(None) => debug!(%operation, %key, "cache miss"),
            Err(err) => {
                warn!(%operation, %key, error = %err, "cache read failed; fetching directly");
            }
        }

        let value = fetch().await?;

        match serde_json::to_string(&value) {
            Ok(payload) => {
                let ttl = self.ttls.ttl_for(operation);
                if let Err(err) = self.backend.set(&key, payload, ttl).await {
                    warn!(%operation, %key, error = %err, "cache write failed");
                }
            }
            Err(err) => {
                warn!(%operation, %key, error = %err, "failed to serialize listing for cache");
            }
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::CatalogError;

    #[derive(Debug)]
    struct UnreachableBackend;

    #[async_trait]
    impl CacheBackend for UnreachableBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(CatalogError::Cache("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
            Err(CatalogError::Cache("connection refused".into()))
        }
    }

    async fn counted_fetch(calls: &AtomicUsize) -> Result<Vec<String>> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![format!("fetch-{n}")])
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_ttl_is_served_from_cache() {
        let cache = ListingCache::in_memory(CacheTtls::default());
        let params = QueryParams::from_pairs([("page", "1")]);
        let calls = AtomicUsize::new(0);

        let first: Vec<String> = cache
            .get_or_fetch(CachedOperation::Movies, &params, || counted_fetch(&calls))
            .await
            .unwrap();
        let second: Vec<String> = cache
            .get_or_fetch(CachedOperation::Movies, &params, || counted_fetch(&calls))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_triggers_refetch() {
        let ttls = CacheTtls::default();
        let cache = ListingCache::in_memory(ttls);
        let params = QueryParams::new();
        let calls = AtomicUsize::new(0);

        let _: Vec<String> = cache
            .get_or_fetch(CachedOperation::Genres, &params, || counted_fetch(&calls))
            .await
            .unwrap();
        tokio::time::advance(ttls.genres + Duration::from_secs(1)).await;
        let after: Vec<String> = cache
            .get_or_fetch(CachedOperation::Genres, &params, || counted_fetch(&calls))
            .await
            .unwrap();

        assert_eq!(after, vec!["fetch-1".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_backend_falls_through_to_fetch() {
        let cache = ListingCache::new(Arc::new(UnreachableBackend), CacheTtls::default());
        let calls = AtomicUsize::new(0);

        let value: Vec<String> = cache
            .get_or_fetch(CachedOperation::Cinemas, &QueryParams::new(), || {
                counted_fetch(&calls)
            })
            .await
            .unwrap();

        assert_eq!(value, vec!["fetch-0".to_string()]);
    }

    #[tokio::test]
    async fn fetch_errors_are_not_cached() {
        let cache = ListingCache::in_memory(CacheTtls::default());
        let params = QueryParams::new();

        let failed: Result<Vec<String>> = cache
            .get_or_fetch(CachedOperation::Actors, &params, || async {
                Err(CatalogError::Database("boom".into()))
            })
            .await;
        assert!(failed.is_err());

        let calls = AtomicUsize::new(0);
        let _: Vec<String> = cache
            .get_or_fetch(CachedOperation::Actors, &params, || counted_fetch(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn undecodable_entry_is_treated_as_miss() {
        let backend = Arc::new(InMemoryCache::new());
        let params = QueryParams::new();
        backend
            .set(
                &CacheKeys::listing("trending", &params),
                "not json".into(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();
        let cache = ListingCache::new(backend, CacheTtls::default());
        let calls = AtomicUsize::new(0);

        let value: Vec<String> = cache
            .get_or_fetch(CachedOperation::Trending, &params, || counted_fetch(&calls))
            .await
            .unwrap();
        assert_eq!(value, vec!["fetch-0".to_string()]);
    }
}
