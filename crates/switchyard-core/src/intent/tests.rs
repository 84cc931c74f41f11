use super::*;
use std::collections::HashMap;

#[test]
fn test_creative_vision_query() {
    let classifier = IntentClassifier::new();
    let result = classifier.classify("Help me define my creative vision");

    assert_eq!(result.category, IntentCategory::CreativeOrientation);
    assert!(result.confidence > 0.0);
    assert_eq!(result.matched_keywords, vec!["creative", "vision"]);
}

#[test]
fn test_no_match_defaults_to_conversation() {
    let classifier = IntentClassifier::new();

    for query in ["", "   ", "zzz qqq", "the of and", "1234 5678"] {
        let result = classifier.classify(query);
        assert_eq!(result.category, IntentCategory::Conversation, "{query:?}");
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_keywords.is_empty());
        assert!(result.is_default());
    }
}

#[test]
fn test_confidence_is_capped() {
    let classifier = IntentClassifier::new();
    let result = classifier.classify("creative vision, imagine a dream story full of art");

    assert_eq!(result.category, IntentCategory::CreativeOrientation);
    assert_eq!(result.confidence, 1.0);
}

#[test]
fn test_repeated_keyword_counts_once() {
    let classifier = IntentClassifier::new();
    let result = classifier.classify("debug debug debug");

    assert_eq!(result.category, IntentCategory::TechnicalAnalysis);
    assert_eq!(result.matched_keywords, vec!["debug"]);
    assert!((result.confidence - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_case_and_punctuation_insensitive() {
    let classifier = IntentClassifier::new();
    let lower = classifier.classify("search the docs");
    let upper = classifier.classify("SEARCH, the DOCS!");

    assert_eq!(lower, upper);
    assert_eq!(lower.category, IntentCategory::RagRetrieval);
}

#[test]
fn test_tie_broken_by_priority() {
    // one keyword each: rag-retrieval (1/2) vs data-processing (1/2)
    let classifier = IntentClassifier::new();
    let result = classifier.classify("search csv");
    assert_eq!(result.category, IntentCategory::RagRetrieval);

    // creative-orientation (1/2) beats structural-thinking (1/2)
    let result = classifier.classify("outline the story");
    assert_eq!(result.category, IntentCategory::CreativeOrientation);
}

#[test]
fn test_higher_confidence_beats_priority() {
    let classifier = IntentClassifier::new();
    // creative 1/2 = 0.5, data-processing 2/2 = 1.0
    let result = classifier.classify("parse and clean this csv story");
    assert_eq!(result.category, IntentCategory::DataProcessing);
}

#[test]
fn test_explicit_override() {
    let classifier = IntentClassifier::new();
    let result = classifier.resolve("Help me define my creative vision", Some(IntentCategory::RagRetrieval));

    assert_eq!(result.category, IntentCategory::RagRetrieval);
    assert_eq!(result.confidence, 1.0);
    assert!(result.matched_keywords.is_empty());

    let classified = classifier.resolve("Help me define my creative vision", None);
    assert_eq!(classified.category, IntentCategory::CreativeOrientation);
}

#[test]
fn test_auto_never_classified() {
    let classifier = IntentClassifier::new();
    assert!(classifier.keywords_for(IntentCategory::Auto).is_empty());
    assert_ne!(classifier.classify("auto").category, IntentCategory::Auto);
}

#[test]
fn test_configured_keywords_replace_defaults() {
    let mut keywords = HashMap::new();
    keywords.insert(
        IntentCategory::RagRetrieval,
        vec!["Wiki".to_string(), "step by step".to_string()],
    );
    let mut normalization = HashMap::new();
    normalization.insert(IntentCategory::RagRetrieval, 1.0);

    let classifier = IntentClassifier::from_config(&IntentConfig {
        keywords,
        normalization,
        ..Default::default()
    });

    assert_eq!(
        classifier.keywords_for(IntentCategory::RagRetrieval),
        vec!["wiki", "step by step"]
    );

    let result = classifier.classify("check the wiki");
    assert_eq!(result.category, IntentCategory::RagRetrieval);
    assert_eq!(result.confidence, 1.0);

    // default rag keyword no longer present
    assert!(classifier.classify("search").is_default());

    // phrase keywords match contiguous tokens only
    let phrase = classifier.classify("walk me through it step by step");
    assert_eq!(phrase.matched_keywords, vec!["step by step"]);
    assert!(classifier.classify("step and step by").is_default());
}

#[test]
fn test_input_too_long_uses_default() {
    let classifier = IntentClassifier::from_config(&IntentConfig {
        max_input_length: 16,
        ..Default::default()
    });

    let result = classifier.classify("creative vision creative vision creative vision");
    assert!(result.is_default());
}

#[test]
fn test_category_parsing_and_serialization() {
    assert_eq!(
        "rag_retrieval".parse::<IntentCategory>().unwrap(),
        IntentCategory::RagRetrieval
    );
    assert_eq!(
        "Creative-Orientation".parse::<IntentCategory>().unwrap(),
        IntentCategory::CreativeOrientation
    );
    assert!("poetry".parse::<IntentCategory>().is_err());

    let json = serde_json::to_string(&IntentCategory::TechnicalAnalysis).unwrap();
    assert_eq!(json, "\"technical-analysis\"");

    for category in IntentCategory::ALL {
        assert_eq!(category.as_str().parse::<IntentCategory>().unwrap(), category);
    }
}

#[test]
fn test_expected_capabilities() {
    assert_eq!(IntentCategory::RagRetrieval.expected_capability(), Some("rag"));
    assert_eq!(IntentCategory::Auto.expected_capability(), None);
}
