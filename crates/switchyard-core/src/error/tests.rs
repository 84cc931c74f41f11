use super::*;

fn attempt(backend: &str, flow: &str) -> Attempt {
    Attempt {
        backend_id: backend.to_string(),
        flow_id: flow.to_string(),
        score: 0.5,
        success: false,
        latency_ms: 10,
        error: Some("boom".to_string()),
    }
}

#[test]
fn test_attempted_backends_deduplicates_in_order() {
    let error = Error::ExecutionFailed {
        attempts: vec![
            attempt("langflow", "a"),
            attempt("flowise", "b"),
            attempt("langflow", "c"),
        ],
        last_error: "boom".to_string(),
    };

    assert_eq!(error.attempted_backends(), vec!["langflow", "flowise"]);
}

#[test]
fn test_attempted_backends_empty_for_other_errors() {
    let error = Error::BackendNotFound("langflow".to_string());
    assert!(error.attempted_backends().is_empty());
}

#[test]
fn test_execution_failed_message_lists_backends() {
    let error = Error::ExecutionFailed {
        attempts: vec![attempt("langflow", "a"), attempt("flowise", "b")],
        last_error: "timeout".to_string(),
    };

    let msg = error.user_message();
    assert!(msg.contains("langflow, flowise"));
    assert!(msg.contains("timeout"));
    assert!(error.to_string().contains("2 candidate(s)"));
}

#[test]
fn test_routing_failure_classification() {
    assert!(Error::NoCandidates {
        intent: "conversation".to_string()
    }
    .is_routing_failure());
    assert!(Error::BackendNotFound("x".to_string()).is_routing_failure());
    assert!(!Error::DuplicateBackend("x".to_string()).is_routing_failure());
    assert!(!Error::Internal("x".to_string()).is_routing_failure());
}

#[test]
fn test_suggestions() {
    let error = Error::BackendNotFound("langflow".to_string());
    assert!(error.user_message().contains("langflow"));
    assert!(error.suggestion().unwrap().contains("register"));

    assert!(Error::Internal("x".to_string()).suggestion().is_none());
}
