//! Backend client trait definition
//!
//! Every workflow engine integration implements [`BackendClient`]. Expected
//! failures (refused connections, timeouts, bad responses) come back as typed
//! values so the router can fall back instead of unwinding.

use super::types::{BackendKind, ConnectionResult, ExecutionOutcome, Flow, HealthStatus};
use thiserror::Error;

/// Errors a client may report from flow discovery
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendClientError {
    /// The engine could not be reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The engine answered with something the client could not interpret
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The engine did not answer in time
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

/// Trait for workflow engine clients
#[async_trait::async_trait]
pub trait BackendClient: Send + Sync {
    /// Engine family this client speaks to
    fn kind(&self) -> BackendKind;

    /// Open (or verify) a connection to the engine
    async fn connect(&self) -> ConnectionResult;

    /// Fetch the engine's flow catalog
    async fn discover_flows(&self) -> Result<Vec<Flow>, BackendClientError>;

    /// Probe engine health
    async fn health_check(&self) -> HealthStatus;

    /// Run a flow with the given input, continuing a backend session if a token is given
    async fn execute(
        &self,
        flow_id: &str,
        input: &str,
        session_token: Option<&str>,
    ) -> ExecutionOutcome;
}
