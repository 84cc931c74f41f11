//! Request and response types for the query router

use crate::intent::{IntentCategory, IntentResult};
use crate::scorer::RoutingDecision;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A query to route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free-text query
    pub query: String,
    /// Session to continue (a new one is created when absent or unknown)
    #[serde(default)]
    pub session_id: Option<String>,
    /// Intent override
    #[serde(default)]
    pub intent: Option<IntentCategory>,
    /// Backend override (id, name or engine kind)
    #[serde(default)]
    pub backend: Option<String>,
    /// Flow override
    #[serde(default)]
    pub flow: Option<String>,
    /// Context merged into the session
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl QueryRequest {
    /// Create a request with no overrides
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Continue an existing session
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Skip classification
    #[must_use]
    pub fn with_intent(mut self, intent: IntentCategory) -> Self {
        self.intent = Some(intent);
        self
    }

    /// Skip scoring and use this backend
    #[must_use]
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Use this flow
    #[must_use]
    pub fn with_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    /// Add a context entry
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// One execution attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Backend tried
    pub backend_id: String,
    /// Flow tried
    pub flow_id: String,
    /// Candidate score at the time
    pub score: f64,
    /// Whether it succeeded
    pub success: bool,
    /// Reported latency
    pub latency_ms: u64,
    /// Failure detail
    pub error: Option<String>,
}

/// Outcome of the final attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the flow ran successfully
    pub success: bool,
    /// Output payload
    pub output: serde_json::Value,
    /// Reported latency
    pub latency_ms: u64,
    /// Backend that produced the result
    pub backend_id: String,
    /// Flow that produced the result
    pub flow_id: String,
    /// Whether an earlier candidate failed first
    pub fallback_used: bool,
    /// Failure detail
    pub error: Option<String>,
}

/// Routed result with its routing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Execution result
    pub result: ExecutionResult,
    /// Decision that produced the result
    pub decision: RoutingDecision,
    /// Resolved intent
    pub intent: IntentResult,
    /// Session the turn belongs to
    pub session_id: String,
    /// Every attempt, in order
    pub attempts: Vec<Attempt>,
    /// Whether the session reached the store
    pub session_persisted: bool,
}
