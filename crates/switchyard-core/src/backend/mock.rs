//! Mock backend for testing
//!
//! Returns scripted execution outcomes, falling back to an echo response once
//! the script is exhausted.

use super::client::{BackendClient, BackendClientError};
use super::types::{BackendKind, ConnectionResult, ExecutionOutcome, Flow, HealthStatus};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A scripted in-process backend
pub struct MockBackend {
    kind: BackendKind,
    flows: Mutex<Vec<Flow>>,
    outcomes: Mutex<VecDeque<ExecutionOutcome>>,
    executions: Mutex<Vec<(String, Option<String>)>>,
    connect_ok: AtomicBool,
    healthy: AtomicBool,
}

impl MockBackend {
    /// Create a mock that connects, reports healthy and hosts no flows.
    #[must_use]
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            flows: Mutex::new(Vec::new()),
            outcomes: Mutex::new(VecDeque::new()),
            executions: Mutex::new(Vec::new()),
            connect_ok: AtomicBool::new(true),
            healthy: AtomicBool::new(true),
        }
    }

    /// Set the catalog returned by discovery.
    #[must_use]
    pub fn with_flows(self, flows: Vec<Flow>) -> Self {
        self.set_flows(flows);
        self
    }

    /// Replace the catalog returned by the next discovery.
    pub fn set_flows(&self, flows: Vec<Flow>) {
        *self.flows.lock().unwrap_or_else(|e| e.into_inner()) = flows;
    }

    /// Make `connect` succeed or fail.
    pub fn set_connectable(&self, ok: bool) {
        self.connect_ok.store(ok, Ordering::SeqCst);
    }

    /// Make `health_check` succeed or fail.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Queue an outcome for the next execution.
    pub fn push_outcome(&self, outcome: ExecutionOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Queue a failed execution.
    pub fn fail_next(&self, error: impl Into<String>) {
        self.push_outcome(ExecutionOutcome::failure(error, 5));
    }

    /// Number of `execute` calls made so far.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// `(flow_id, session_token)` pairs seen by `execute`, in call order.
    #[must_use]
    pub fn executions(&self) -> Vec<(String, Option<String>)> {
        self.executions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl BackendClient for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn connect(&self) -> ConnectionResult {
        if self.connect_ok.load(Ordering::SeqCst) {
            ConnectionResult::connected()
        } else {
            ConnectionResult::failed("mock connection refused")
        }
    }

    async fn discover_flows(&self) -> Result<Vec<Flow>, BackendClientError> {
        if !self.connect_ok.load(Ordering::SeqCst) {
            return Err(BackendClientError::Unavailable(
                "mock connection refused".to_string(),
            ));
        }
        Ok(self.flows.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn health_check(&self) -> HealthStatus {
        if self.healthy.load(Ordering::SeqCst) {
            HealthStatus::healthy(1)
        } else {
            HealthStatus::unhealthy("mock backend unhealthy")
        }
    }

    async fn execute(
        &self,
        flow_id: &str,
        input: &str,
        session_token: Option<&str>,
    ) -> ExecutionOutcome {
        self.executions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((flow_id.to_string(), session_token.map(str::to_string)));

        let queued = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        queued.unwrap_or_else(|| {
            ExecutionOutcome::success(
                serde_json::json!({
                    "backend": self.kind.as_str(),
                    "flow": flow_id,
                    "echo": input,
                }),
                5,
            )
            .with_session_token(format!("{}-session", self.kind.as_str()))
        })
    }
}
