use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use super::{MemoryCacheStore, SqliteCacheStore};

/// Capability interface for the key/value cache with per-entry TTL.
///
/// All operations are safe under concurrent callers. Backend failures are
/// absorbed: `get` reports a miss and `set`/`remove` log and return, so a
/// flaky backend degrades to extra recomputation, never to a failed request.
/// Each miss path re-attempts `set`, which repopulates the cache as soon as
/// the backend recovers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` if absent, expired, or the
    /// backend is unavailable.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    /// Removes a key. Removing an absent key is a no-op.
    async fn remove(&self, key: &str);

    /// Purges expired entries, returning how many were dropped.
    async fn cleanup_expired(&self) -> u64;

    /// Drops every entry.
    async fn clear(&self);

    /// Number of entries currently stored (expired ones may be counted
    /// until the next cleanup).
    async fn len(&self) -> u64;
}

/// Builds the process-wide cache store from the `CACHE_BACKEND` environment
/// variable: `memory` (default) or `sqlite` (shared table in the main
/// database). Selected once at startup; callers only see `dyn CacheStore`.
pub fn build_cache_store(pool: &Pool<Sqlite>) -> Arc<dyn CacheStore> {
    let backend = std::env::var("CACHE_BACKEND").unwrap_or_else(|_| "memory".to_string());

    match backend.as_str() {
        "sqlite" => {
            tracing::info!("Using sqlite cache backend");
            Arc::new(SqliteCacheStore::new(pool.clone()))
        }
        "memory" => {
            tracing::info!("Using in-memory cache backend");
            Arc::new(MemoryCacheStore::new())
        }
        other => {
            tracing::warn!("Unknown CACHE_BACKEND '{}', falling back to memory", other);
            Arc::new(MemoryCacheStore::new())
        }
    }
}
