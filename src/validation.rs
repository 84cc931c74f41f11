//! Configuration validation
//!
//! Rejects configurations that cannot start and warns about risky ones.

use crate::config::AppConfig;
use anyhow::{bail, Result};
use std::collections::HashSet;
use switchyard_core::SessionBackendKind;
use tracing::warn;

/// Validate a loaded configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for backend in &config.backends {
        if backend.id.trim().is_empty() {
            bail!("Backend ids must not be empty");
        }
        if !seen.insert(backend.id.as_str()) {
            bail!("Backend '{}' is declared more than once", backend.id);
        }
    }

    if config.session.key_prefix.is_empty() {
        bail!("session.key_prefix must not be empty");
    }

    if config.session.ttl_secs == 0 {
        warn!("session.ttl_secs is 0: sessions will never expire");
    }

    if config.backends.is_empty() {
        warn!("No backends configured; every query will fail until one is registered");
    }

    let is_production = std::env::var("SWITCHYARD_ENV")
        .map(|v| v.to_lowercase() == "production")
        .unwrap_or(false);

    if is_production && config.session.backend == SessionBackendKind::Memory {
        warn!("In-memory sessions do not survive restarts. Consider session.backend = \"redis\".");
    }

    if is_production
        && config.session.backend == SessionBackendKind::Redis
        && !config.session.redis_url.contains('@')
    {
        warn!("Redis connection appears to have no authentication in production.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{BackendDescriptor, BackendKind};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_duplicate_backend_ids_rejected() {
        let mut config = AppConfig::default();
        config.backends = vec![
            BackendDescriptor::new("a", BackendKind::Langflow, "http://a"),
            BackendDescriptor::new("a", BackendKind::Dify, "http://b"),
        ];

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_empty_key_prefix_rejected() {
        let mut config = AppConfig::default();
        config.session.key_prefix.clear();
        assert!(validate_config(&config).is_err());
    }
}
