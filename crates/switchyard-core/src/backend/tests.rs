use super::*;

#[test]
fn test_backend_kind_names() {
    assert_eq!(BackendKind::Langflow.as_str(), "langflow");
    assert_eq!(BackendKind::N8n.to_string(), "n8n");

    let json = serde_json::to_string(&BackendKind::Flowise).unwrap();
    assert_eq!(json, "\"flowise\"");
}

#[test]
fn test_connection_status_serialization() {
    let json = serde_json::to_string(&ConnectionStatus::Connected).unwrap();
    assert_eq!(json, "\"connected\"");
    assert_eq!(ConnectionStatus::Error.to_string(), "error");
}

#[test]
fn test_descriptor_defaults_name_to_id() {
    let descriptor = BackendDescriptor::new("lf", BackendKind::Langflow, "http://localhost:7860")
        .with_capabilities(["rag", "chat"]);

    assert_eq!(descriptor.name, "lf");
    assert!(descriptor.capabilities.contains("rag"));

    let named = descriptor.with_name("Langflow");
    assert_eq!(named.name, "Langflow");
}

#[test]
fn test_flow_keywords_are_lowercased() {
    let flow = Flow::new("f1", "Vision")
        .with_keywords(["Creative", "VISION"])
        .with_capabilities(["Creative"]);

    assert!(flow.intent_keywords.contains("creative"));
    assert!(flow.intent_keywords.contains("vision"));
    assert!(flow.declares_capability("creative"));
    assert!(!flow.declares_capability("rag"));
}

#[test]
fn test_flow_deserializes_with_missing_fields() {
    let flow: Flow = serde_json::from_str(r#"{"id": "f1", "name": "Minimal"}"#).unwrap();
    assert!(flow.intent_keywords.is_empty());
    assert_eq!(flow.performance, FlowPerformance::default());
}

#[tokio::test]
async fn test_mock_backend_scripted_outcomes() {
    let mock = MockBackend::new(BackendKind::Generic);
    mock.fail_next("first call fails");

    let first = mock.execute("f1", "hello", None).await;
    assert!(!first.success);
    assert_eq!(first.error.as_deref(), Some("first call fails"));

    let second = mock.execute("f1", "hello", Some("tok")).await;
    assert!(second.success);
    assert_eq!(second.output["echo"], "hello");

    assert_eq!(mock.execution_count(), 2);
    assert_eq!(mock.executions()[1].1.as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_mock_backend_connectivity_switches() {
    let mock = MockBackend::new(BackendKind::Dify).with_flows(vec![Flow::new("f1", "One")]);

    assert!(mock.connect().await.connected);
    assert_eq!(mock.discover_flows().await.unwrap().len(), 1);

    mock.set_connectable(false);
    assert!(!mock.connect().await.connected);
    assert!(mock.discover_flows().await.is_err());

    mock.set_healthy(false);
    assert!(!mock.health_check().await.healthy);
}
