//! Key-value persistence collaborator

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a [`KvStore`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed a command
    #[error("store command failed: {0}")]
    Command(String),
}

/// Minimal key-value store used for session persistence
///
/// Values are JSON text. Patterns passed to `scan` are globs (`*`, `?`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value that expires after `ttl` (zero means never)
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration)
        -> Result<(), StoreError>;

    /// Keys matching a glob pattern
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Remove a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}
