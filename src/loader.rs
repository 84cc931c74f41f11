//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable selecting `config/<env>.toml`
const ENV_SELECTOR: &str = "SWITCHYARD_ENV";

/// Load configuration from files and environment
///
/// Layers, lowest priority first: embedded defaults, `config/default`,
/// `config/<SWITCHYARD_ENV>` (default `development`), `config/local`, then
/// `SWITCHYARD_<SECTION>__<KEY>` variables. A `.env` file is read first if present.
pub fn load_config() -> Result<AppConfig> {
    let _ = dotenvy::dotenv();

    let profile = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());
    let profile_file = format!("config/{profile}");
    let builder = ["config/default", profile_file.as_str(), "config/local"]
        .into_iter()
        .fold(with_defaults(), |builder, name| {
            builder.add_source(File::with_name(name).required(false))
        })
        .add_source(
            Environment::with_prefix("SWITCHYARD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    finish(builder)
}

/// Parse a TOML document layered over the embedded defaults
pub fn parse_config(toml: &str) -> Result<AppConfig> {
    finish(with_defaults().add_source(File::from_str(toml, FileFormat::Toml)))
}

fn with_defaults() -> ConfigBuilder<DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig> {
    builder
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use switchyard_core::{BackendKind, SessionBackendKind};

    #[test]
    fn test_embedded_defaults_parse() {
        let config = parse_config("").unwrap();

        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.router.max_attempts, 0);
        assert_eq!(config.router.execution_timeout(), None);
        assert_eq!(config.intent.max_input_length, 10_000);
        assert_eq!(config.scoring.stats_window, 100);
        assert_eq!(config.session.backend, SessionBackendKind::Memory);
        assert_eq!(config.session.key_prefix, "switchyard:session:");
        assert_eq!(config.session.ttl_secs, 86_400);
        assert!(config.health.enabled);
        assert!(config.backends.is_empty());
    }

    #[test]
    fn test_overrides_layer_over_defaults() {
        let config = parse_config(
            r#"
            [session]
            ttl_secs = 60

            [[backends]]
            id = "studio"
            kind = "langflow"
            base_url = "http://localhost:7860"
            capabilities = ["creative"]
            "#,
        )
        .unwrap();

        assert_eq!(config.session.ttl_secs, 60);
        assert_eq!(config.session.key_prefix, "switchyard:session:");
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].kind, BackendKind::Langflow);
        assert!(config.backends[0].capabilities.contains("creative"));
    }

    #[test]
    fn test_environment_overrides_embedded_defaults() {
        std::env::set_var("SWITCHYARD_SCORING__STATS_WINDOW", "7");
        let config = load_config();
        std::env::remove_var("SWITCHYARD_SCORING__STATS_WINDOW");

        let config = config.unwrap();
        assert_eq!(config.scoring.stats_window, 7);
        assert_eq!(config.session.key_prefix, "switchyard:session:");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(parse_config("[session]\nbackend = \"etcd\"").is_err());
    }
}
