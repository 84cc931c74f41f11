//! In-memory key-value store
//!
//! Honors TTLs lazily: expired keys are invisible to reads and scans and are
//! dropped by [`MemoryKvStore::purge_expired`]. Data is lost on restart.

use super::kv::{KvStore, StoreError};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process [`KvStore`]
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryKvStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired keys, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, v| v.is_live(now));
        let removed = before - entries.len();

        if removed > 0 {
            debug!(removed, "Purged expired keys");
        }
        removed
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|v| v.is_live(now))
            .count()
    }

    /// Whether no live key exists
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Translate a glob (`*`, `?`) into an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex, StoreError> {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{}$", escaped))
        .map_err(|e| StoreError::Command(format!("invalid pattern '{}': {}", pattern, e)))
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|v| v.is_live(now))
            .map(|v| v.value.clone()))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(Instant::now() + ttl)
        };

        self.entries.write().await.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let matcher = glob_to_regex(pattern)?;
        let now = Instant::now();
        let entries = self.entries.read().await;

        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(k, v)| v.is_live(now) && matcher.is_match(k))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|v| v.is_live(now)))
    }
}
