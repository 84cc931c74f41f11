use super::kv::{KvStore, StoreError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Keys requested per SCAN round trip
const SCAN_BATCH: usize = 100;

/// Redis-backed [`KvStore`] (for production)
///
/// Expiry is handled by Redis itself through `SETEX`.
pub struct RedisKvStore {
    client: redis::Client,
}

impl RedisKvStore {
    /// Create a new Redis store
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid
    pub fn new(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(format!("invalid Redis URL: {}", e)))?;
        Ok(Self { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.get_connection().await?;

        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(format!("Redis GET failed: {}", e)))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;

        // SETEX rejects a zero TTL; sub-second TTLs round up to one second
        let seconds = ttl.as_secs_f64().ceil() as u64;
        if seconds == 0 {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| StoreError::Command(format!("Redis SET failed: {}", e)))?;
        } else {
            redis::cmd("SETEX")
                .arg(key)
                .arg(seconds)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
                .map_err(|e| StoreError::Command(format!("Redis SETEX failed: {}", e)))?;
        }

        debug!(key = %key, ttl = seconds, "Value saved to Redis");
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.get_connection().await?;
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::Command(format!("Redis SCAN failed: {}", e)))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;

        let deleted: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Command(format!("Redis DEL failed: {}", e)))?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            RedisKvStore::new("not a url"),
            Err(StoreError::Unavailable(_))
        ));
    }

    // Redis tests require a running Redis instance
    // Run with: cargo test --features redis-tests
    #[cfg(feature = "redis-tests")]
    #[tokio::test]
    async fn test_redis_round_trip() {
        let store = RedisKvStore::new("redis://127.0.0.1:6379").unwrap();

        store
            .set_with_ttl("switchyard:test:key", "{\"a\":1}", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(
            store.get("switchyard:test:key").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(store
            .scan("switchyard:test:*")
            .await
            .unwrap()
            .contains(&"switchyard:test:key".to_string()));
        assert!(store.delete("switchyard:test:key").await.unwrap());
    }
}
