use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use super::store::CacheStore;

/// Cache backend on the shared `cache_entries` table.
///
/// This is the out-of-process backend: several instances pointed at the same
/// database observe the same entries. Expiry is enforced on read, so no
/// sweeper is required for correctness; `cleanup_expired` just reclaims
/// space.
///
/// Database errors on the cache path are logged and reported as a miss, per
/// the store contract.
#[derive(Clone)]
pub struct SqliteCacheStore {
    pool: Pool<Sqlite>,
}

impl SqliteCacheStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let result = sqlx::query_scalar::<_, Vec<u8>>(
            "SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?",
        )
        .bind(key)
        .bind(Utc::now().to_rfc3339())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Cache get failed for '{}', treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());

        let result = sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(&value)
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!("Cache set failed for '{}': {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await;

        if let Err(e) = result {
            tracing::warn!("Cache remove failed for '{}': {}", key, e);
        }
    }

    async fn cleanup_expired(&self) -> u64 {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => done.rows_affected(),
            Err(e) => {
                tracing::warn!("Cache cleanup failed: {}", e);
                0
            }
        }
    }

    async fn clear(&self) {
        if let Err(e) = sqlx::query("DELETE FROM cache_entries").execute(&self.pool).await {
            tracing::warn!("Cache clear failed: {}", e);
        }
    }

    async fn len(&self) -> u64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await
            .map(|n| n as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    async fn test_store() -> SqliteCacheStore {
        let database = Database::connect("sqlite::memory:").await.unwrap();
        SqliteCacheStore::new(database.pool().clone())
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let cache = test_store().await;

        cache
            .set("key1", b"value1".to_vec(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("key1").await, Some(b"value1".to_vec()));

        cache.remove("key1").await;
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent_and_cleanable() {
        let cache = test_store().await;

        cache
            .set("stale", b"x".to_vec(), Duration::from_millis(10))
            .await;
        cache
            .set("fresh", b"y".to_vec(), Duration::from_secs(60))
            .await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        // Expiry is enforced on read even before cleanup runs
        assert_eq!(cache.get("stale").await, None);
        assert_eq!(cache.get("fresh").await, Some(b"y".to_vec()));

        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_overwrites_value_and_ttl() {
        let cache = test_store().await;

        cache
            .set("key1", b"old".to_vec(), Duration::from_millis(10))
            .await;
        cache
            .set("key1", b"new".to_vec(), Duration::from_secs(60))
            .await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("key1").await, Some(b"new".to_vec()));
    }
}
