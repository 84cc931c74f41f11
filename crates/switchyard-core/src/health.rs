//! Background health probing
//!
//! [`HealthMonitor`] probes every registered backend on a fixed interval so
//! the scorer always has recent health data. Queries never wait on it.
//!
//! ```ignore
//! let handle = HealthMonitor::new(registry, Duration::from_secs(30)).spawn();
//! // ...
//! handle.shutdown().await;
//! ```

use crate::registry::BackendRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodic health prober
pub struct HealthMonitor {
    registry: Arc<BackendRegistry>,
    interval: Duration,
}

impl HealthMonitor {
    /// Create a monitor probing every `interval` (minimum one second)
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Probe every backend once, returning how many were healthy
    pub async fn run_once(&self) -> usize {
        let results = self.registry.health_check_all().await;
        let healthy = results.iter().filter(|(_, s)| s.healthy).count();

        if healthy < results.len() {
            warn!(
                healthy,
                total = results.len(),
                "Some backends failed their health probe"
            );
        } else {
            debug!(healthy, "Health probe round complete");
        }
        healthy
    }

    /// Start probing in a background task
    #[must_use]
    pub fn spawn(self) -> HealthMonitorHandle {
        let token = CancellationToken::new();
        let child = token.clone();

        let task = tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "Health monitor started");
            loop {
                tokio::select! {
                    _ = self.run_once() => {}
                    _ = child.cancelled() => {
                        debug!("Health monitor cancelled mid-round");
                        return;
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = child.cancelled() => {
                        debug!("Health monitor shutting down");
                        return;
                    }
                }
            }
        });

        HealthMonitorHandle { token, task }
    }
}

/// Handle to a running [`HealthMonitor`]
pub struct HealthMonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl HealthMonitorHandle {
    /// Token that stops the monitor when cancelled
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the monitor task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the monitor and wait for it to exit
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Health monitor task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BackendClient, BackendClientError, BackendDescriptor, BackendKind, ConnectionResult,
        ExecutionOutcome, Flow, HealthStatus, MockBackend,
    };

    #[tokio::test]
    async fn test_run_once_updates_registry() {
        let registry = Arc::new(BackendRegistry::new());
        let sick = Arc::new(MockBackend::new(BackendKind::N8n));
        sick.set_healthy(false);
        registry
            .register(
                BackendDescriptor::new("ok", BackendKind::Dify, "http://ok"),
                Arc::new(MockBackend::new(BackendKind::Dify)),
            )
            .await
            .unwrap();
        registry
            .register(BackendDescriptor::new("sick", BackendKind::N8n, "http://sick"), sick)
            .await
            .unwrap();

        let monitor = HealthMonitor::new(registry.clone(), Duration::from_secs(30));
        assert_eq!(monitor.run_once().await, 1);

        let sick = registry.get("sick").await.unwrap();
        assert_eq!(sick.health.consecutive_failures, 1);
        assert_eq!(
            registry.get("ok").await.unwrap().health.last_healthy,
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_spawned_monitor_probes_and_stops() {
        let registry = Arc::new(BackendRegistry::new());
        registry
            .register(
                BackendDescriptor::new("a", BackendKind::Generic, "http://a"),
                Arc::new(MockBackend::new(BackendKind::Generic)),
            )
            .await
            .unwrap();

        let handle = HealthMonitor::new(registry.clone(), Duration::from_secs(60)).spawn();

        // the first round runs immediately
        for _ in 0..50 {
            if registry.get("a").await.unwrap().health.last_checked.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(registry.get("a").await.unwrap().health.last_checked.is_some());

        let token = handle.token();
        handle.shutdown().await;
        assert!(token.is_cancelled());
    }

    /// Backend whose health probe never returns
    struct HangingProbe;

    #[async_trait::async_trait]
    impl BackendClient for HangingProbe {
        fn kind(&self) -> BackendKind {
            BackendKind::Generic
        }

        async fn connect(&self) -> ConnectionResult {
            ConnectionResult::connected()
        }

        async fn discover_flows(&self) -> Result<Vec<Flow>, BackendClientError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> HealthStatus {
            std::future::pending().await
        }

        async fn execute(&self, _: &str, _: &str, _: Option<&str>) -> ExecutionOutcome {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_shutdown_does_not_wait_for_hung_probe() {
        let registry = Arc::new(BackendRegistry::new());
        registry
            .register(
                BackendDescriptor::new("stuck", BackendKind::Generic, "http://stuck"),
                Arc::new(HangingProbe),
            )
            .await
            .unwrap();

        let handle = HealthMonitor::new(registry, Duration::from_secs(60)).spawn();
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .expect("shutdown should not wait for the probe round");
    }
}
