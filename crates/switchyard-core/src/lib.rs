//! Switchyard Core - Query Routing & Session Continuity Engine
//!
//! This crate routes natural-language queries to independently hosted AI
//! workflow engines ("backends"), including:
//! - Intent: Keyword-table classification of queries
//! - Registry: Known backends, connection state and flow catalogs
//! - Scorer: Weighted suitability of (backend, flow) pairs
//! - Router: Execution with re-ranked fallback
//! - Session: TTL-bounded, failure-tolerant session persistence
//! - Health: Background health probing
//! - Observability: Fire-and-forget trace events

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod health;
pub mod intent;
pub mod observability;
pub mod registry;
pub mod router;
pub mod scorer;
pub mod session;

pub use backend::{
    BackendClient, BackendClientError, BackendDescriptor, BackendId, BackendKind,
    ConnectionResult, ConnectionStatus, ExecutionOutcome, Flow, FlowPerformance, HealthStatus,
    MockBackend,
};
pub use config::{
    HealthConfig, IntentConfig, RouterConfig, ScoringConfig, SessionBackendKind, SessionConfig,
};
pub use error::{Error, Result, UserFriendlyError};
pub use health::{HealthMonitor, HealthMonitorHandle};
pub use intent::{IntentCategory, IntentClassifier, IntentResult};
pub use observability::{NoopObserver, ObservationEvent, Observer, ObserverError, TracingObserver};
pub use registry::{
    BackendRegistry, BackendSnapshot, HealthSnapshot, PerformanceStats, RegistrySnapshot,
};
pub use router::{Attempt, ExecutionResult, QueryRequest, QueryResponse, QueryRouter};
pub use scorer::{BackendScorer, Candidate, RoutingDecision, ScoreBreakdown, ScoringWeights};
pub use session::{
    HistoryEntry, HistoryRole, KvStore, MemoryKvStore, RedisKvStore, Session, SessionMetadata,
    SessionStatus, SessionStoreAdapter, StoreError, SESSION_SCHEMA_VERSION,
};
