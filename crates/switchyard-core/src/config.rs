//! Engine configuration types
//!
//! Every section deserializes with defaults so a partial TOML file (or none)
//! yields a working engine.

use crate::intent::IntentCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Query router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Maximum execution attempts per query (primary + fallbacks, 0 = candidate count)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Per-attempt execution timeout in milliseconds (0 = no limit)
    #[serde(default)]
    pub execution_timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            execution_timeout_ms: 0,
        }
    }
}

impl RouterConfig {
    /// Per-attempt timeout, if any
    #[must_use]
    pub fn execution_timeout(&self) -> Option<Duration> {
        (self.execution_timeout_ms > 0).then(|| Duration::from_millis(self.execution_timeout_ms))
    }
}

fn default_max_attempts() -> usize {
    0
}

fn default_true() -> bool {
    true
}

/// Intent classifier configuration
///
/// Keyword tables are product-tuning data: categories are fixed, their
/// keyword sets are not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Replacement keyword lists per category
    #[serde(default)]
    pub keywords: HashMap<IntentCategory, Vec<String>>,
    /// Replacement normalization constants per category
    #[serde(default)]
    pub normalization: HashMap<IntentCategory, f64>,
    /// Inputs longer than this classify as the default without scanning
    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            keywords: HashMap::new(),
            normalization: HashMap::new(),
            max_input_length: default_max_input_length(),
        }
    }
}

fn default_max_input_length() -> usize {
    10_000
}

/// Scorer and performance-window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// A successful probe older than this no longer counts as recent
    #[serde(default = "default_health_recency_secs")]
    pub health_recency_secs: u64,
    /// Consecutive probe failures that drive health to zero
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Executions kept per backend for success-rate and latency averages
    #[serde(default = "default_stats_window")]
    pub stats_window: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            health_recency_secs: default_health_recency_secs(),
            max_consecutive_failures: default_max_consecutive_failures(),
            stats_window: default_stats_window(),
        }
    }
}

impl ScoringConfig {
    /// Recency window as a chrono duration
    #[must_use]
    pub fn health_recency(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.health_recency_secs).unwrap_or(i64::MAX))
    }
}

fn default_health_recency_secs() -> u64 {
    120
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_stats_window() -> usize {
    100
}

/// Which persistence collaborator backs sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// In-process map (lost on restart)
    #[default]
    Memory,
    /// Redis key-value store
    Redis,
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Persistence collaborator
    #[serde(default)]
    pub backend: SessionBackendKind,
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Key prefix for session entries
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Time-to-live applied on every save
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackendKind::default(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl SessionConfig {
    /// TTL as a duration
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "switchyard:session:".to_string()
}

fn default_ttl_secs() -> u64 {
    24 * 3600
}

/// Background health monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Run the monitor
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between probe rounds
    #[serde(default = "default_health_interval_secs")]
    pub interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_health_interval_secs(),
        }
    }
}

fn default_health_interval_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.max_consecutive_failures, 5);
        assert_eq!(scoring.health_recency(), chrono::Duration::seconds(120));

        let session = SessionConfig::default();
        assert_eq!(session.backend, SessionBackendKind::Memory);
        assert_eq!(session.ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_partial_deserialization() {
        let session: SessionConfig =
            serde_json::from_str(r#"{"backend": "redis", "ttl_secs": 60}"#).unwrap();
        assert_eq!(session.backend, SessionBackendKind::Redis);
        assert_eq!(session.ttl_secs, 60);
        assert_eq!(session.key_prefix, "switchyard:session:");

        let intent: IntentConfig =
            serde_json::from_str(r#"{"keywords": {"rag-retrieval": ["wiki"]}}"#).unwrap();
        assert_eq!(
            intent.keywords.get(&IntentCategory::RagRetrieval),
            Some(&vec!["wiki".to_string()])
        );
        assert_eq!(intent.max_input_length, 10_000);
    }
}
