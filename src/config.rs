//! Application configuration types
//!
//! Contains every section of the Switchyard configuration file.

use serde::{Deserialize, Serialize};
use switchyard_core::{
    BackendDescriptor, HealthConfig, IntentConfig, RouterConfig, ScoringConfig, SessionConfig,
};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Backends registered at startup, in preference order
    #[serde(default)]
    pub backends: Vec<BackendDescriptor>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Fallback filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "switchyard=info,switchyard_core=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_log_filter(),
        }
    }
}
