//! Switchyard - Multi-Backend Query Router
//!
//! Wires the routing engine in `switchyard-core` into a running service:
//! - Config: Layered TOML + environment configuration
//! - Logging: `tracing` subscriber setup
//! - Bootstrap: Store, registry, router and health monitor assembly

#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod loader;
pub mod logging;
pub mod validation;

pub use bootstrap::{bootstrap, ClientFactory, Switchyard};
pub use config::{AppConfig, LogFormat, LoggingConfig};
pub use loader::{load_config, parse_config, DEFAULT_CONFIG};
pub use logging::init_tracing;
pub use validation::validate_config;

pub use switchyard_core;
