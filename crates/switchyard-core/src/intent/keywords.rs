//! Default keyword tables
//!
//! Tuning data, overridable per category through [`IntentConfig`](crate::config::IntentConfig).

use super::IntentCategory;

/// Built-in keywords and normalization constant for a category
pub(crate) fn default_table(category: IntentCategory) -> (&'static [&'static str], f64) {
    match category {
        IntentCategory::CreativeOrientation => (
            &[
                "creative",
                "creativity",
                "vision",
                "envision",
                "imagine",
                "inspire",
                "inspiration",
                "story",
                "storytelling",
                "art",
                "artistic",
                "dream",
                "aspiration",
                "brainstorm",
                "compose",
            ],
            2.0,
        ),
        IntentCategory::TechnicalAnalysis => (
            &[
                "analyze",
                "analysis",
                "technical",
                "debug",
                "diagnose",
                "code",
                "bug",
                "error",
                "performance",
                "benchmark",
                "algorithm",
                "optimize",
                "architecture",
                "review",
            ],
            3.0,
        ),
        IntentCategory::StructuralThinking => (
            &[
                "structure",
                "structural",
                "framework",
                "organize",
                "outline",
                "hierarchy",
                "breakdown",
                "plan",
                "roadmap",
                "steps",
                "system",
                "categorize",
            ],
            2.0,
        ),
        IntentCategory::RagRetrieval => (
            &[
                "search",
                "find",
                "retrieve",
                "lookup",
                "document",
                "documents",
                "docs",
                "knowledge",
                "source",
                "sources",
                "reference",
                "cite",
            ],
            2.0,
        ),
        IntentCategory::DataProcessing => (
            &[
                "data",
                "dataset",
                "csv",
                "json",
                "transform",
                "parse",
                "extract",
                "aggregate",
                "convert",
                "clean",
                "table",
                "etl",
            ],
            2.0,
        ),
        IntentCategory::Conversation => (
            &[
                "hello",
                "hi",
                "hey",
                "thanks",
                "thank",
                "chat",
                "talk",
                "discuss",
                "conversation",
                "greetings",
            ],
            2.0,
        ),
        IntentCategory::Auto => (&[], 1.0),
    }
}
