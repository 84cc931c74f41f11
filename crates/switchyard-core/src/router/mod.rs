//! Query router - classify, score, execute, fall back, persist.
//!
//! For every query the router:
//!
//! 1. Resolves the session (loaded from the store or created)
//! 2. Resolves the intent (caller override wins over classification)
//! 3. Ranks candidates over connected backends, or takes the explicit backend
//! 4. Executes the best candidate; on failure records the stats, drops the
//!    failed backend and re-ranks what is left against a fresh snapshot
//! 5. Persists the session after every attempt
//!
//! The registry is never locked while a backend executes, and the session is
//! a local value written whole, so a dropped future leaves the store at the
//! last completed save.
//!
//! # Example
//!
//! ```ignore
//! use switchyard_core::{QueryRequest, QueryRouter};
//!
//! let router = QueryRouter::new(registry, classifier, scorer).with_sessions(sessions);
//! let response = router
//!     .route(QueryRequest::new("Help me define my creative vision"))
//!     .await?;
//! println!("{} answered via {}", response.result.backend_id, response.result.flow_id);
//! ```

mod types;


pub use types::{Attempt, ExecutionResult, QueryRequest, QueryResponse};

use crate::backend::{BackendId, ExecutionOutcome};
use crate::config::RouterConfig;
use crate::error::{Error, Result};
use crate::intent::{IntentClassifier, IntentResult};
use crate::observability::{NoopObserver, ObservationEvent, Observer, ObserverError};
use crate::registry::BackendRegistry;
use crate::scorer::{BackendScorer, Candidate, RoutingDecision};
use crate::session::{HistoryRole, Session, SessionStatus, SessionStoreAdapter};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// How candidates are chosen for a query
enum Selection {
    /// Caller named the backend (and maybe the flow); no fallback
    Explicit,
    /// Scored over connected backends, optionally pinned to a flow id
    Scored { flow: Option<String> },
}

/// Routes queries to the best backend flow
pub struct QueryRouter {
    registry: Arc<BackendRegistry>,
    classifier: IntentClassifier,
    scorer: BackendScorer,
    sessions: Option<SessionStoreAdapter>,
    observer: Arc<dyn Observer>,
    config: RouterConfig,
}

impl QueryRouter {
    /// Create a router with no session persistence and no observer
    #[must_use]
    pub fn new(
        registry: Arc<BackendRegistry>,
        classifier: IntentClassifier,
        scorer: BackendScorer,
    ) -> Self {
        Self {
            registry,
            classifier,
            scorer,
            sessions: None,
            observer: Arc::new(NoopObserver),
            config: RouterConfig::default(),
        }
    }

    /// Persist sessions through this adapter
    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionStoreAdapter) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Send trace events to this observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Set router configuration
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Registry this router reads from
    #[must_use]
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Session adapter, if persistence is enabled
    #[must_use]
    pub fn sessions(&self) -> Option<&SessionStoreAdapter> {
        self.sessions.as_ref()
    }

    /// Route one query
    #[instrument(skip(self, request), fields(session_id = ?request.session_id, query_len = request.query.len()))]
    pub async fn route(&self, request: QueryRequest) -> Result<QueryResponse> {
        let trace_id = Uuid::new_v4().to_string();

        let mut session = self.resolve_session(&request).await;
        session.context.extend(request.context.clone());
        session.push(HistoryRole::User, request.query.as_str());

        self.notify(
            self.observer
                .start_trace(&trace_id, &session.id, &request.query),
        );

        let intent = self.classifier.resolve(&request.query, request.intent);
        self.notify(self.observer.observe(
            &trace_id,
            &ObservationEvent::Classified {
                category: intent.category.to_string(),
                confidence: intent.confidence,
                explicit: request.intent.is_some(),
            },
        ));

        let (selection, ranked) = match self.initial_candidates(&request, &intent).await {
            Ok(found) => found,
            Err(e) => {
                self.notify(self.observer.end_trace(&trace_id, false));
                return Err(e);
            }
        };

        let limit = match self.config.max_attempts {
            0 => ranked.len(),
            n => n.min(ranked.len()),
        };

        let mut ranked = ranked;
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut failed: HashSet<BackendId> = HashSet::new();
        let mut last_error = String::new();

        while attempts.len() < limit {
            let Some(decision) = RoutingDecision::from_ranked(ranked) else {
                break;
            };
            let decision = if attempts.is_empty() {
                decision
            } else {
                decision.as_fallback()
            };

            self.notify(self.observer.observe(
                &trace_id,
                &ObservationEvent::Routed {
                    backend_id: decision.backend_id.clone(),
                    flow_id: decision.flow_id.clone(),
                    score: decision.score,
                    fallback: decision.fallback,
                },
            ));

            let outcome = self
                .execute(&decision, &request.query, session.token_for(&decision.backend_id))
                .await;
            self.registry
                .record_execution(&decision.backend_id, outcome.success, outcome.latency_ms)
                .await;

            attempts.push(Attempt {
                backend_id: decision.backend_id.clone(),
                flow_id: decision.flow_id.clone(),
                score: decision.score,
                success: outcome.success,
                latency_ms: outcome.latency_ms,
                error: outcome.error.clone(),
            });
            self.notify(self.observer.observe(
                &trace_id,
                &ObservationEvent::Attempt {
                    backend_id: decision.backend_id.clone(),
                    flow_id: decision.flow_id.clone(),
                    success: outcome.success,
                    latency_ms: outcome.latency_ms,
                    error: outcome.error.clone(),
                },
            ));

            if outcome.success {
                session = self.bind_session(session, &decision, &outcome).await;
                let persisted = self.persist(&trace_id, &session).await;

                self.notify(self.observer.score(&trace_id, "routing_score", decision.score));
                self.notify(self.observer.end_trace(&trace_id, true));

                info!(
                    backend = %decision.backend_id,
                    flow = %decision.flow_id,
                    intent = %intent.category,
                    attempts = attempts.len(),
                    fallback = decision.fallback,
                    "Query completed"
                );

                return Ok(QueryResponse {
                    result: ExecutionResult {
                        success: true,
                        output: outcome.output,
                        latency_ms: outcome.latency_ms,
                        backend_id: decision.backend_id.clone(),
                        flow_id: decision.flow_id.clone(),
                        fallback_used: decision.fallback,
                        error: None,
                    },
                    decision,
                    intent,
                    session_id: session.id,
                    attempts,
                    session_persisted: persisted,
                });
            }

            last_error = outcome
                .error
                .unwrap_or_else(|| "execution failed".to_string());
            warn!(
                backend = %decision.backend_id,
                flow = %decision.flow_id,
                error = %last_error,
                "Attempt failed"
            );

            session.push(
                HistoryRole::System,
                format!(
                    "attempt on {}/{} failed: {}",
                    decision.backend_id, decision.flow_id, last_error
                ),
            );
            self.persist(&trace_id, &session).await;

            failed.insert(decision.backend_id);
            ranked = match &selection {
                Selection::Explicit => Vec::new(),
                Selection::Scored { flow } => {
                    self.rank_remaining(&intent, &failed, flow.as_deref())
                        .await
                }
            };
        }

        self.notify(self.observer.end_trace(&trace_id, false));
        warn!(
            attempts = attempts.len(),
            error = %last_error,
            "Query failed on every candidate"
        );
        Err(Error::ExecutionFailed {
            attempts,
            last_error,
        })
    }

    /// Load the requested session, or start a new one
    async fn resolve_session(&self, request: &QueryRequest) -> Session {
        let Some(id) = request.session_id.as_deref() else {
            return Session::new();
        };

        let loaded = match &self.sessions {
            Some(sessions) => sessions.load(id).await,
            None => None,
        };

        match loaded {
            Some(session)
                if !matches!(
                    session.status,
                    SessionStatus::Closed | SessionStatus::Expired
                ) =>
            {
                debug!(session_id = %id, turns = session.history.len(), "Resuming session");
                session
            }
            _ => Session::with_id(id),
        }
    }

    async fn initial_candidates(
        &self,
        request: &QueryRequest,
        intent: &IntentResult,
    ) -> Result<(Selection, Vec<Candidate>)> {
        if let Some(reference) = request.backend.as_deref() {
            let backend = self
                .registry
                .find(reference)
                .await
                .ok_or_else(|| Error::BackendNotFound(reference.to_string()))?;

            let flow = match request.flow.as_deref() {
                Some(flow_id) => backend.flow(flow_id).ok_or_else(|| {
                    Error::BackendNotFound(format!("{}/{}", backend.id, flow_id))
                })?,
                None => backend.flows.first().ok_or_else(|| {
                    Error::BackendNotFound(format!("{} (no flows)", backend.id))
                })?,
            };

            let candidate = self
                .scorer
                .score(intent, &backend, flow, chrono::Utc::now());
            return Ok((Selection::Explicit, vec![candidate]));
        }

        let flow = request.flow.clone();
        let ranked = self
            .rank_remaining(intent, &HashSet::new(), flow.as_deref())
            .await;
        if ranked.is_empty() {
            return Err(Error::NoCandidates {
                intent: intent.category.to_string(),
            });
        }
        Ok((Selection::Scored { flow }, ranked))
    }

    /// Rank connected backends not yet tried
    async fn rank_remaining(
        &self,
        intent: &IntentResult,
        failed: &HashSet<BackendId>,
        flow: Option<&str>,
    ) -> Vec<Candidate> {
        let snapshot = self
            .registry
            .snapshot()
            .await
            .connected_only()
            .without(failed);

        let mut ranked = self.scorer.rank(intent, &snapshot);
        if let Some(flow_id) = flow {
            ranked.retain(|c| c.flow_id == flow_id);
        }
        ranked
    }

    async fn execute(
        &self,
        decision: &RoutingDecision,
        query: &str,
        session_token: Option<&str>,
    ) -> ExecutionOutcome {
        let Some(client) = self.registry.client(&decision.backend_id).await else {
            return ExecutionOutcome::failure(
                format!("backend '{}' is no longer registered", decision.backend_id),
                0,
            );
        };

        let call = client.execute(&decision.flow_id, query, session_token);
        match self.config.execution_timeout() {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => ExecutionOutcome::failure(
                    format!("timed out after {}ms", limit.as_millis()),
                    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                ),
            },
            None => call.await,
        }
    }

    /// Attach a successful turn to the session, archiving it on a backend switch
    async fn bind_session(
        &self,
        session: Session,
        decision: &RoutingDecision,
        outcome: &ExecutionOutcome,
    ) -> Session {
        let mut session = if session.is_bound_elsewhere(&decision.backend_id) {
            if let Some(sessions) = &self.sessions {
                sessions.archive(&session).await;
            }
            debug!(
                session_id = %session.id,
                from = ?session.backend_id,
                to = %decision.backend_id,
                "Session switched backend"
            );
            session.rebind(decision.backend_id.clone())
        } else {
            session
        };

        session.backend_id = Some(decision.backend_id.clone());
        session.current_flow_id = Some(decision.flow_id.clone());
        if let Some(token) = &outcome.session_token {
            session.backend_session_token = Some(token.clone());
        }
        session.push(HistoryRole::Assistant, output_text(&outcome.output));
        session
    }

    async fn persist(&self, trace_id: &str, session: &Session) -> bool {
        let Some(sessions) = &self.sessions else {
            return false;
        };
        let saved = sessions.save(session).await;
        self.notify(
            self.observer
                .observe(trace_id, &ObservationEvent::SessionPersisted { saved }),
        );
        saved
    }

    fn notify(&self, result: std::result::Result<(), ObserverError>) {
        if let Err(e) = result {
            debug!(error = %e, "Observer error ignored");
        }
    }
}

/// History text for a flow output
fn output_text(output: &serde_json::Value) -> String {
    match output {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
