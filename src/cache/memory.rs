use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::store::CacheStore;

/// A cached value with its insertion time and time-to-live.
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// In-process cache backend.
///
/// Expired entries are dropped lazily on `get` and in bulk by
/// `CacheCleanupTask`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let expired = {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some(entry) if entry.is_expired() => true,
                Some(entry) => return Some(entry.data.clone()),
                None => return None,
            }
        };

        if expired {
            if let Ok(mut entries) = self.entries.write() {
                entries.remove(key);
            }
        }
        None
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), CacheEntry::new(value, ttl));
        }
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    async fn cleanup_expired(&self) -> u64 {
        if let Ok(mut entries) = self.entries.write() {
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired());
            (before - entries.len()) as u64
        } else {
            0
        }
    }

    async fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    async fn len(&self) -> u64 {
        self.entries.read().map(|e| e.len() as u64).unwrap_or(0)
    }
}

/// Periodic expiry sweep for a cache backend.
pub struct CacheCleanupTask {
    cache: Arc<dyn CacheStore>,
    interval: Duration,
}

impl CacheCleanupTask {
    pub fn new(cache: Arc<dyn CacheStore>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    pub async fn start(self) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            let dropped = self.cache.cleanup_expired().await;
            tracing::debug!(
                "Cache cleanup completed: dropped {} entries, {} remaining",
                dropped,
                self.cache.len().await
            );
        }
    }
}
