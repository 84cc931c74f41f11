//! Trace events emitted while routing a query
//!
//! Observers are fire-and-forget: the router never waits on them beyond the
//! call itself and ignores every error they return. Implementations that talk
//! to a remote sink should buffer internally.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error reported by an observer sink
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("observer sink error: {0}")]
pub struct ObserverError(pub String);

/// Something that happened within a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservationEvent {
    /// Intent resolved for the query
    Classified {
        /// Category name
        category: String,
        /// Confidence (0.0 - 1.0)
        confidence: f64,
        /// Whether the caller supplied the intent
        explicit: bool,
    },
    /// A candidate was chosen for execution
    Routed {
        /// Backend id
        backend_id: String,
        /// Flow id
        flow_id: String,
        /// Candidate score
        score: f64,
        /// Whether this replaces a failed attempt
        fallback: bool,
    },
    /// An execution attempt finished
    Attempt {
        /// Backend id
        backend_id: String,
        /// Flow id
        flow_id: String,
        /// Whether it succeeded
        success: bool,
        /// Reported latency
        latency_ms: u64,
        /// Failure detail
        error: Option<String>,
    },
    /// The session was written (or not)
    SessionPersisted {
        /// Whether the store accepted it
        saved: bool,
    },
}

/// Sink for routing traces
pub trait Observer: Send + Sync {
    /// A query started
    fn start_trace(&self, trace_id: &str, session_id: &str, query: &str)
        -> Result<(), ObserverError>;

    /// An event within a trace
    fn observe(&self, trace_id: &str, event: &ObservationEvent) -> Result<(), ObserverError>;

    /// A named numeric score attached to a trace
    fn score(&self, trace_id: &str, name: &str, value: f64) -> Result<(), ObserverError>;

    /// A query finished
    fn end_trace(&self, trace_id: &str, success: bool) -> Result<(), ObserverError>;
}

/// Observer that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn start_trace(&self, _: &str, _: &str, _: &str) -> Result<(), ObserverError> {
        Ok(())
    }

    fn observe(&self, _: &str, _: &ObservationEvent) -> Result<(), ObserverError> {
        Ok(())
    }

    fn score(&self, _: &str, _: &str, _: f64) -> Result<(), ObserverError> {
        Ok(())
    }

    fn end_trace(&self, _: &str, _: bool) -> Result<(), ObserverError> {
        Ok(())
    }
}

/// Observer that writes events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn start_trace(
        &self,
        trace_id: &str,
        session_id: &str,
        query: &str,
    ) -> Result<(), ObserverError> {
        debug!(trace_id, session_id, query_len = query.len(), "trace started");
        Ok(())
    }

    fn observe(&self, trace_id: &str, event: &ObservationEvent) -> Result<(), ObserverError> {
        match event {
            ObservationEvent::Attempt {
                backend_id,
                success: false,
                error,
                ..
            } => warn!(trace_id, backend = %backend_id, error = ?error, "attempt failed"),
            ObservationEvent::Routed {
                backend_id,
                flow_id,
                score,
                fallback,
            } => info!(
                trace_id,
                backend = %backend_id,
                flow = %flow_id,
                score,
                fallback,
                "query routed"
            ),
            other => debug!(trace_id, event = ?other, "trace event"),
        }
        Ok(())
    }

    fn score(&self, trace_id: &str, name: &str, value: f64) -> Result<(), ObserverError> {
        debug!(trace_id, name, value, "trace score");
        Ok(())
    }

    fn end_trace(&self, trace_id: &str, success: bool) -> Result<(), ObserverError> {
        debug!(trace_id, success, "trace finished");
        Ok(())
    }
}
