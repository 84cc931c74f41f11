//! Service assembly
//!
//! Builds the session store, backend registry, router and health monitor
//! from an [`AppConfig`].

use crate::config::AppConfig;
use crate::validation::validate_config;
use anyhow::{Context, Result};
use std::sync::Arc;
use switchyard_core::{
    BackendClient, BackendDescriptor, BackendRegistry, BackendScorer, HealthMonitor,
    HealthMonitorHandle, IntentClassifier, KvStore, MemoryKvStore, QueryRouter, RedisKvStore,
    SessionBackendKind, SessionStoreAdapter, TracingObserver,
};
use tracing::{info, warn};

/// Creates clients for configured backends
///
/// Returning `None` skips the backend.
pub trait ClientFactory {
    /// Build a client for this descriptor
    fn create(&self, descriptor: &BackendDescriptor) -> Option<Arc<dyn BackendClient>>;
}

impl<F> ClientFactory for F
where
    F: Fn(&BackendDescriptor) -> Option<Arc<dyn BackendClient>>,
{
    fn create(&self, descriptor: &BackendDescriptor) -> Option<Arc<dyn BackendClient>> {
        self(descriptor)
    }
}

/// A running Switchyard instance
pub struct Switchyard {
    pub config: AppConfig,
    pub registry: Arc<BackendRegistry>,
    pub router: Arc<QueryRouter>,
    pub sessions: SessionStoreAdapter,
    monitor: Option<HealthMonitorHandle>,
}

impl Switchyard {
    /// Whether the background health monitor is running
    pub fn health_monitor_running(&self) -> bool {
        self.monitor.as_ref().is_some_and(|m| !m.is_finished())
    }

    /// Stop background tasks
    pub async fn shutdown(self) {
        if let Some(monitor) = self.monitor {
            monitor.shutdown().await;
        }
        info!("Switchyard stopped");
    }
}

/// Build the session store selected by configuration
fn init_store(config: &AppConfig) -> Result<Arc<dyn KvStore>> {
    let store: Arc<dyn KvStore> = match config.session.backend {
        SessionBackendKind::Memory => {
            info!("Using in-memory session store");
            Arc::new(MemoryKvStore::new())
        }
        SessionBackendKind::Redis => {
            let store = RedisKvStore::new(&config.session.redis_url)
                .context("Failed to create Redis session store")?;
            info!("Using Redis session store");
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Assemble and start a Switchyard instance
///
/// Backends that fail to connect stay registered in the `error` state and
/// never abort startup.
pub async fn bootstrap(config: AppConfig, factory: &impl ClientFactory) -> Result<Switchyard> {
    validate_config(&config)?;

    let store = init_store(&config)?;
    let sessions = SessionStoreAdapter::new(store, &config.session);

    let registry = Arc::new(BackendRegistry::with_stats_window(
        config.scoring.stats_window,
    ));
    for descriptor in &config.backends {
        let Some(client) = factory.create(descriptor) else {
            warn!(backend = %descriptor.id, kind = %descriptor.kind, "No client available, skipping backend");
            continue;
        };
        registry
            .register(descriptor.clone(), client)
            .await
            .with_context(|| format!("Failed to register backend '{}'", descriptor.id))?;
    }

    let connected = registry.connect_all().await;
    let total = registry.len().await;
    if connected < total {
        warn!(connected, total, "Some backends failed to connect");
    } else {
        info!(connected, "All backends connected");
    }

    let router = QueryRouter::new(
        registry.clone(),
        IntentClassifier::from_config(&config.intent),
        BackendScorer::new(config.scoring.clone()),
    )
    .with_sessions(sessions.clone())
    .with_observer(Arc::new(TracingObserver))
    .with_config(config.router.clone());

    let monitor = if config.health.enabled {
        Some(
            HealthMonitor::new(
                registry.clone(),
                std::time::Duration::from_secs(config.health.interval_secs),
            )
            .spawn(),
        )
    } else {
        None
    };

    info!(backends = total, "Switchyard started");

    Ok(Switchyard {
        config,
        registry,
        router: Arc::new(router),
        sessions,
        monitor,
    })
}
