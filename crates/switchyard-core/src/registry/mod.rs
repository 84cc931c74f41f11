//! Backend registry for managing known workflow engines.
//!
//! The registry owns every registered backend, its connection state, flow
//! catalog and rolling statistics.
//!
//! # Overview
//!
//! - **Per-backend serialization**: connect and health probes on one backend
//!   take that backend's operation lock, so they never interleave
//! - **Snapshot reads**: [`BackendRegistry::snapshot`] copies out a consistent
//!   view; catalogs are `Arc<[Flow]>` replaced whole, never edited in place
//! - **No lock across I/O**: state locks are released before any collaborator
//!   call is awaited
//!
//! # Example
//!
//! ```ignore
//! use switchyard_core::{BackendDescriptor, BackendKind, BackendRegistry};
//!
//! let registry = BackendRegistry::new();
//! let id = registry
//!     .register(BackendDescriptor::new("lf", BackendKind::Langflow, url), client)
//!     .await?;
//! registry.connect(&id).await?;
//!
//! for flow in registry.list_flows(Some(&id)).await {
//!     println!("{}: {}", flow.id, flow.name);
//! }
//! ```

mod stats;


pub use stats::{HealthSnapshot, PerformanceStats};

use crate::backend::{
    BackendClient, BackendDescriptor, BackendId, BackendKind, ConnectionStatus, Flow,
    HealthStatus,
};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use stats::PerformanceWindow;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Default number of executions kept per backend
const DEFAULT_STATS_WINDOW: usize = 100;

struct BackendState {
    status: ConnectionStatus,
    flows: Arc<[Flow]>,
    performance: PerformanceWindow,
    health: HealthSnapshot,
    last_error: Option<String>,
}

struct BackendEntry {
    descriptor: BackendDescriptor,
    order: usize,
    client: Arc<dyn BackendClient>,
    /// Serializes collaborator-driven mutations (connect, health probes)
    op_lock: Mutex<()>,
    state: RwLock<BackendState>,
}

impl BackendEntry {
    async fn snapshot(&self) -> BackendSnapshot {
        let state = self.state.read().await;
        BackendSnapshot {
            id: self.descriptor.id.clone(),
            name: self.descriptor.name.clone(),
            kind: self.descriptor.kind,
            base_url: self.descriptor.base_url.clone(),
            capabilities: self.descriptor.capabilities.clone(),
            status: state.status,
            flows: Arc::clone(&state.flows),
            performance: state.performance.snapshot(),
            health: state.health.clone(),
            last_error: state.last_error.clone(),
            order: self.order,
        }
    }
}

/// Read-only view of one backend
#[derive(Debug, Clone)]
pub struct BackendSnapshot {
    /// Backend id
    pub id: BackendId,
    /// Display name
    pub name: String,
    /// Engine family
    pub kind: BackendKind,
    /// Base address
    pub base_url: String,
    /// Backend-level capabilities
    pub capabilities: BTreeSet<String>,
    /// Connection state
    pub status: ConnectionStatus,
    /// Flow catalog (last successful discovery)
    pub flows: Arc<[Flow]>,
    /// Rolling execution performance
    pub performance: PerformanceStats,
    /// Latest health probe state
    pub health: HealthSnapshot,
    /// Last connect error
    pub last_error: Option<String>,
    /// Registration order (0-based)
    pub order: usize,
}

impl BackendSnapshot {
    /// Whether the backend is connected
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Look up a flow in the catalog
    #[must_use]
    pub fn flow(&self, flow_id: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.id == flow_id)
    }
}

/// Consistent view of the whole registry
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Backends in registration order
    pub backends: Vec<BackendSnapshot>,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    /// Keep only connected backends
    #[must_use]
    pub fn connected_only(mut self) -> Self {
        self.backends.retain(BackendSnapshot::is_connected);
        self
    }

    /// Drop the given backends
    #[must_use]
    pub fn without(mut self, excluded: &HashSet<BackendId>) -> Self {
        self.backends.retain(|b| !excluded.contains(&b.id));
        self
    }

    /// Look up a backend by id
    #[must_use]
    pub fn get(&self, backend_id: &str) -> Option<&BackendSnapshot> {
        self.backends.iter().find(|b| b.id == backend_id)
    }

    /// Total flows across all backends
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.backends.iter().map(|b| b.flows.len()).sum()
    }
}

/// Registry of workflow backends
pub struct BackendRegistry {
    /// Entries in registration order
    entries: RwLock<Vec<Arc<BackendEntry>>>,
    stats_window: usize,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_stats_window(DEFAULT_STATS_WINDOW)
    }

    /// Create an empty registry keeping `window` executions per backend
    #[must_use]
    pub fn with_stats_window(window: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            stats_window: window.max(1),
        }
    }

    /// Register a backend in the `disconnected` state
    pub async fn register(
        &self,
        mut descriptor: BackendDescriptor,
        client: Arc<dyn BackendClient>,
    ) -> Result<BackendId> {
        if descriptor.name.is_empty() {
            descriptor.name = descriptor.id.clone();
        }

        let mut entries = self.entries.write().await;

        if entries
            .iter()
            .any(|e| e.descriptor.id == descriptor.id || e.descriptor.name == descriptor.name)
        {
            return Err(Error::DuplicateBackend(descriptor.id));
        }

        if client.kind() != descriptor.kind {
            warn!(
                backend = %descriptor.id,
                declared = %descriptor.kind,
                client = %client.kind(),
                "Backend kind does not match its client"
            );
        }

        let id = descriptor.id.clone();
        let order = entries.last().map(|e| e.order + 1).unwrap_or(0);
        entries.push(Arc::new(BackendEntry {
            descriptor,
            order,
            client,
            op_lock: Mutex::new(()),
            state: RwLock::new(BackendState {
                status: ConnectionStatus::Disconnected,
                flows: Arc::from(Vec::new()),
                performance: PerformanceWindow::new(self.stats_window),
                health: HealthSnapshot::default(),
                last_error: None,
            }),
        }));

        info!(backend = %id, order, "Registered backend");
        Ok(id)
    }

    /// Remove a backend
    pub async fn unregister(&self, backend_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.descriptor.id != backend_id);

        if entries.len() == before {
            return Err(Error::BackendNotFound(backend_id.to_string()));
        }
        debug!(backend = %backend_id, "Unregistered backend");
        Ok(())
    }

    async fn entry(&self, backend_id: &str) -> Option<Arc<BackendEntry>> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|e| e.descriptor.id == backend_id)
            .cloned()
    }

    async fn all_entries(&self) -> Vec<Arc<BackendEntry>> {
        self.entries.read().await.clone()
    }

    /// Connect to a backend and replace its flow catalog
    ///
    /// On failure the backend moves to `error` and keeps its previous catalog.
    #[instrument(skip(self))]
    pub async fn connect(&self, backend_id: &str) -> Result<usize> {
        let entry = self
            .entry(backend_id)
            .await
            .ok_or_else(|| Error::BackendNotFound(backend_id.to_string()))?;

        let _op = entry.op_lock.lock().await;

        {
            let mut state = entry.state.write().await;
            // a live backend keeps serving its current catalog while re-discovering
            if state.status != ConnectionStatus::Connected {
                state.status = ConnectionStatus::Connecting;
            }
        }

        let connection = entry.client.connect().await;
        let discovered = if connection.connected {
            entry
                .client
                .discover_flows()
                .await
                .map_err(|e| e.to_string())
        } else {
            Err(connection
                .message
                .unwrap_or_else(|| "connection refused".to_string()))
        };

        match discovered {
            Ok(flows) => {
                let catalog = normalize_catalog(backend_id, flows);
                let count = catalog.len();

                let mut state = entry.state.write().await;
                state.status = ConnectionStatus::Connected;
                state.flows = catalog;
                state.last_error = None;
                drop(state);

                info!(backend = %backend_id, flows = count, "Backend connected");
                Ok(count)
            }
            Err(message) => {
                let mut state = entry.state.write().await;
                state.status = ConnectionStatus::Error;
                state.last_error = Some(message.clone());
                let cached = state.flows.len();
                drop(state);

                warn!(
                    backend = %backend_id,
                    cached_flows = cached,
                    error = %message,
                    "Backend connection failed, keeping cached catalog"
                );
                Err(Error::Connection {
                    backend: backend_id.to_string(),
                    message,
                })
            }
        }
    }

    /// Connect every registered backend, returning how many succeeded
    pub async fn connect_all(&self) -> usize {
        let ids: Vec<BackendId> = self
            .all_entries()
            .await
            .iter()
            .map(|e| e.descriptor.id.clone())
            .collect();

        let results = futures::future::join_all(ids.iter().map(|id| self.connect(id))).await;
        results.iter().filter(|r| r.is_ok()).count()
    }

    /// Probe a backend's health and record the result
    ///
    /// Never fails: unknown backends and probe errors yield an unhealthy status.
    #[instrument(skip(self))]
    pub async fn health_check(&self, backend_id: &str) -> HealthStatus {
        let Some(entry) = self.entry(backend_id).await else {
            return HealthStatus::unhealthy(format!("backend not registered: {}", backend_id));
        };

        let _op = entry.op_lock.lock().await;
        let status = entry.client.health_check().await;

        let mut state = entry.state.write().await;
        state
            .health
            .record(status.healthy, status.checked_at, status.message.clone());
        let failures = state.health.consecutive_failures;
        drop(state);

        if status.healthy {
            debug!(backend = %backend_id, latency_ms = ?status.latency_ms, "Health probe ok");
        } else {
            warn!(
                backend = %backend_id,
                consecutive_failures = failures,
                error = ?status.message,
                "Health probe failed"
            );
        }
        status
    }

    /// Probe every backend concurrently
    pub async fn health_check_all(&self) -> Vec<(BackendId, HealthStatus)> {
        let ids: Vec<BackendId> = self
            .all_entries()
            .await
            .iter()
            .map(|e| e.descriptor.id.clone())
            .collect();

        let statuses =
            futures::future::join_all(ids.iter().map(|id| self.health_check(id))).await;
        ids.into_iter().zip(statuses).collect()
    }

    /// Record an execution outcome in the backend's performance window
    pub async fn record_execution(&self, backend_id: &str, success: bool, latency_ms: u64) {
        let Some(entry) = self.entry(backend_id).await else {
            debug!(backend = %backend_id, "Ignoring execution stats for unknown backend");
            return;
        };

        entry
            .state
            .write()
            .await
            .performance
            .record(success, latency_ms);
    }

    /// Flows of one backend, or of all backends in registration order
    pub async fn list_flows(&self, backend_id: Option<&str>) -> Vec<Flow> {
        let mut flows = Vec::new();
        for entry in self.all_entries().await {
            if backend_id.is_some_and(|id| id != entry.descriptor.id) {
                continue;
            }
            let catalog = Arc::clone(&entry.state.read().await.flows);
            flows.extend(catalog.iter().cloned());
        }
        flows
    }

    /// Consistent view of every backend
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let entries = self.all_entries().await;
        let mut backends = Vec::with_capacity(entries.len());
        for entry in entries {
            backends.push(entry.snapshot().await);
        }
        RegistrySnapshot {
            backends,
            taken_at: Utc::now(),
        }
    }

    /// View of one backend by id
    pub async fn get(&self, backend_id: &str) -> Option<BackendSnapshot> {
        match self.entry(backend_id).await {
            Some(entry) => Some(entry.snapshot().await),
            None => None,
        }
    }

    /// Resolve a caller-supplied reference: id, then name, then engine kind
    pub async fn find(&self, reference: &str) -> Option<BackendSnapshot> {
        let entries = self.all_entries().await;
        let found = entries
            .iter()
            .find(|e| e.descriptor.id == reference)
            .or_else(|| {
                entries
                    .iter()
                    .find(|e| e.descriptor.name.eq_ignore_ascii_case(reference))
            })
            .or_else(|| {
                entries
                    .iter()
                    .find(|e| e.descriptor.kind.as_str().eq_ignore_ascii_case(reference))
            })
            .cloned();

        match found {
            Some(entry) => Some(entry.snapshot().await),
            None => None,
        }
    }

    /// Client handle used to execute flows on a backend
    pub async fn client(&self, backend_id: &str) -> Option<Arc<dyn BackendClient>> {
        self.entry(backend_id)
            .await
            .map(|e| Arc::clone(&e.client))
    }

    /// Number of registered backends
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no backend is registered
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Point discovered flows at their backend and drop duplicate ids (first wins)
fn normalize_catalog(backend_id: &str, flows: Vec<Flow>) -> Arc<[Flow]> {
    let mut seen = HashSet::new();
    let mut catalog = Vec::with_capacity(flows.len());
    for mut flow in flows {
        if !seen.insert(flow.id.clone()) {
            debug!(backend = %backend_id, flow = %flow.id, "Dropping duplicate flow id");
            continue;
        }
        flow.backend_id = backend_id.to_string();
        catalog.push(flow);
    }
    Arc::from(catalog)
}
