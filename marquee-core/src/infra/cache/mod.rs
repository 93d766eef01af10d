//! Read-through caching for listing endpoints.

pub mod backend;
pub mod keys;
pub mod listing;
pub mod memory;
pub mod redis_backend;

pub use backend::CacheBackend;
pub use keys::{CacheKeys, QueryParams};
pub use listing::{CacheTtls, CachedOperation, ListingCache};
pub use memory::InMemoryCache;
pub use redis_backend::RedisCache;
