//! End-to-end routing scenarios
//!
//! These tests drive the public API only:
//! - Registry + scorer + router with scripted backends
//! - Session persistence over the in-memory store
//! - Degradation when the store is unreachable

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::{
    BackendDescriptor, BackendKind, BackendRegistry, BackendScorer, Error, Flow, IntentCategory,
    IntentClassifier, KvStore, MemoryKvStore, MockBackend, QueryRequest, QueryRouter,
    ScoringConfig, Session, SessionConfig, SessionStoreAdapter, StoreError, UserFriendlyError,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Store that rejects every command
struct UnreachableStore;

#[async_trait]
impl KvStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn scan(&self, _pattern: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn creative_flow() -> Flow {
    Flow::new("vision-coach", "Vision Coach")
        .with_description("Helps articulate a creative vision")
        .with_keywords(["creative", "vision"])
        .with_capabilities(["creative"])
}

fn rag_flow() -> Flow {
    Flow::new("doc-search", "Doc Search")
        .with_keywords(["search", "docs"])
        .with_capabilities(["rag"])
}

async fn connected(registry: &BackendRegistry, id: &str, mock: Arc<MockBackend>) {
    registry
        .register(
            BackendDescriptor::new(id, mock_kind(&mock), format!("http://{}.local", id)),
            mock,
        )
        .await
        .unwrap();
    registry.connect(id).await.unwrap();
}

fn mock_kind(mock: &MockBackend) -> BackendKind {
    use switchyard_core::BackendClient;
    mock.kind()
}

fn router(registry: Arc<BackendRegistry>) -> QueryRouter {
    QueryRouter::new(
        registry,
        IntentClassifier::new(),
        BackendScorer::new(ScoringConfig::default()),
    )
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_creative_vision_scenario() {
    let registry = Arc::new(BackendRegistry::new());
    let docs = Arc::new(MockBackend::new(BackendKind::Dify).with_flows(vec![rag_flow()]));
    let studio = Arc::new(MockBackend::new(BackendKind::Langflow).with_flows(vec![creative_flow()]));
    connected(&registry, "docs", docs).await;
    connected(&registry, "studio", studio.clone()).await;

    let response = router(registry)
        .route(QueryRequest::new("Help me define my creative vision"))
        .await
        .unwrap();

    assert_eq!(response.intent.category, IntentCategory::CreativeOrientation);
    assert!(response.intent.confidence > 0.0);
    assert_eq!(response.result.backend_id, "studio");
    assert!(!response.result.fallback_used);
    assert_eq!(response.result.output["echo"], "Help me define my creative vision");
    assert_eq!(studio.execution_count(), 1);
}

#[tokio::test]
async fn test_missing_explicit_backend_scenario() {
    let registry = Arc::new(BackendRegistry::new());
    let studio = Arc::new(MockBackend::new(BackendKind::Flowise).with_flows(vec![creative_flow()]));
    connected(&registry, "studio", studio.clone()).await;

    let err = router(registry)
        .route(QueryRequest::new("Help me define my creative vision").with_backend("langflow"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BackendNotFound(_)));
    assert!(err.is_routing_failure());
    assert!(err.suggestion().is_some());
    assert_eq!(studio.execution_count(), 0);
}

#[tokio::test]
async fn test_primary_failure_falls_back_to_secondary() {
    let registry = Arc::new(BackendRegistry::new());
    let primary = Arc::new(MockBackend::new(BackendKind::Langflow).with_flows(vec![creative_flow()]));
    let secondary = Arc::new(MockBackend::new(BackendKind::Flowise).with_flows(vec![creative_flow()]));
    connected(&registry, "primary", primary.clone()).await;
    connected(&registry, "secondary", secondary.clone()).await;
    primary.fail_next("upstream 502");

    let response = router(registry.clone())
        .route(QueryRequest::new("Help me define my creative vision"))
        .await
        .unwrap();

    assert_eq!(response.result.backend_id, "secondary");
    assert!(response.result.fallback_used);

    let primary_stats = registry.get("primary").await.unwrap().performance;
    let secondary_stats = registry.get("secondary").await.unwrap().performance;
    assert_eq!((primary_stats.total_requests, primary_stats.success_rate), (1, Some(0.0)));
    assert_eq!((secondary_stats.total_requests, secondary_stats.success_rate), (1, Some(1.0)));
}

#[tokio::test]
async fn test_exhaustion_lists_each_backend_once() {
    let registry = Arc::new(BackendRegistry::new());
    let mut mocks = Vec::new();
    for (id, kind) in [
        ("lf", BackendKind::Langflow),
        ("fw", BackendKind::Flowise),
        ("n8n", BackendKind::N8n),
    ] {
        let mock = Arc::new(
            MockBackend::new(kind).with_flows(vec![creative_flow(), rag_flow()]),
        );
        mock.fail_next(format!("{} is down", id));
        connected(&registry, id, mock.clone()).await;
        mocks.push(mock);
    }

    let err = router(registry)
        .route(QueryRequest::new("Help me define my creative vision"))
        .await
        .unwrap_err();

    let mut attempted = err.attempted_backends();
    assert_eq!(attempted.len(), 3);
    attempted.sort_unstable();
    assert_eq!(attempted, vec!["fw", "lf", "n8n"]);
    assert!(err.to_string().contains("n8n is down"));
    assert!(mocks.iter().all(|m| m.execution_count() == 1));
}

#[tokio::test]
async fn test_queries_complete_when_store_always_fails() {
    let registry = Arc::new(BackendRegistry::new());
    let studio = Arc::new(MockBackend::new(BackendKind::Langflow).with_flows(vec![creative_flow()]));
    connected(&registry, "studio", studio).await;

    let sessions = SessionStoreAdapter::new(Arc::new(UnreachableStore), &SessionConfig::default());
    let router = router(registry).with_sessions(sessions);

    for turn in 0..3 {
        let response = router
            .route(QueryRequest::new("imagine a story").with_session("transient"))
            .await
            .unwrap();
        assert!(response.result.success, "turn {turn}");
        assert!(!response.session_persisted);
    }
}

#[tokio::test]
async fn test_alternates_are_ordered() {
    let registry = Arc::new(BackendRegistry::new());
    for (i, kind) in [
        BackendKind::Langflow,
        BackendKind::Flowise,
        BackendKind::N8n,
        BackendKind::Dify,
    ]
    .into_iter()
    .enumerate()
    {
        let flows = vec![
            creative_flow(),
            rag_flow(),
            Flow::new(format!("misc-{i}"), "Misc").with_keywords(["creative writing"]),
        ];
        let mock = Arc::new(MockBackend::new(kind).with_flows(flows));
        let id = format!("backend-{i}");
        connected(&registry, &id, mock).await;
        for n in 0..i {
            registry.record_execution(&id, n % 2 == 0, 10 * (n as u64 + 1)).await;
        }
    }

    let classifier = IntentClassifier::new();
    let scorer = BackendScorer::default();
    let snapshot = registry.snapshot().await.connected_only();

    for query in [
        "Help me define my creative vision",
        "search the docs",
        "hello there",
        "zzz",
    ] {
        let intent = classifier.classify(query);
        let decision = scorer.decide(&intent, &snapshot).unwrap();
        assert!((0.0..=1.0).contains(&decision.score));

        let mut previous = decision.score;
        for alternate in &decision.alternates {
            assert!((0.0..=1.0).contains(&alternate.score));
            assert!(alternate.score <= previous, "{query}: alternates out of order");
            previous = alternate.score;
        }

        // same inputs, same order
        let again = scorer.decide(&intent, &snapshot).unwrap();
        assert_eq!(decision, again);
    }
}

#[tokio::test]
async fn test_session_round_trip_through_store() {
    let store = Arc::new(MemoryKvStore::new());
    let sessions = SessionStoreAdapter::new(store.clone(), &SessionConfig::default());

    let mut session = Session::with_id("round-trip");
    session.backend_id = Some("studio".to_string());
    session.context.insert("nested".to_string(), serde_json::json!({"a": [1, 2, {"b": null}]}));
    session.push(switchyard_core::HistoryRole::User, "hi");

    assert!(sessions.save(&session).await);
    let first = store.get("switchyard:session:round-trip").await.unwrap();

    let loaded = sessions.load("round-trip").await.unwrap();
    assert!(sessions.save(&loaded).await);
    let second = store.get("switchyard:session:round-trip").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(loaded, session);
}

#[test]
fn test_unmatched_queries_default_to_conversation() {
    let classifier = IntentClassifier::new();
    for query in ["", "qwerty", "the weather is nice", "42", "¿qué tal?"] {
        let intent = classifier.classify(query);
        assert_eq!(intent.category, IntentCategory::Conversation, "{query:?}");
        assert_eq!(intent.confidence, 0.0);
    }
}

#[test]
fn test_mock_backend_outside_a_runtime() {
    use switchyard_core::BackendClient;

    let mock = MockBackend::new(BackendKind::Generic);
    let outcome = tokio_test::block_on(mock.execute("flow", "ping", None));
    assert!(outcome.success);
    assert_eq!(outcome.session_token.as_deref(), Some("generic-session"));
}
