//! Intent classification for incoming queries.
//!
//! The [`IntentClassifier`] maps free text onto a fixed set of
//! [`IntentCategory`] values using per-category keyword tables.
//!
//! # Scoring Algorithm
//!
//! 1. Lowercase the query and split it into alphanumeric tokens
//! 2. For each category, count distinct keywords present in the query
//! 3. `confidence = min(1.0, matches / normalization)`
//! 4. Pick the highest confidence; break ties by category priority
//! 5. No match at all resolves to `conversation` with confidence 0.0
//!
//! Multi-word keywords (`"step by step"`) match as contiguous token runs.
//!
//! # Example
//!
//! ```ignore
//! use switchyard_core::IntentClassifier;
//!
//! let classifier = IntentClassifier::new();
//! let intent = classifier.classify("Help me define my creative vision");
//! assert_eq!(intent.category.as_str(), "creative-orientation");
//! ```

mod keywords;

#[cfg(test)]
mod tests;

use crate::config::IntentConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, instrument};

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("token pattern is valid"));

/// Intent category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentCategory {
    /// Let the router decide; only ever set explicitly
    Auto,
    /// Vision, inspiration, creative direction
    CreativeOrientation,
    /// Analysis, debugging, technical evaluation
    TechnicalAnalysis,
    /// Organizing, planning, structuring ideas
    StructuralThinking,
    /// General conversation (default)
    Conversation,
    /// Knowledge lookup over documents
    RagRetrieval,
    /// Transforming and processing data
    DataProcessing,
}

impl IntentCategory {
    /// Every category, in declaration order
    pub const ALL: [IntentCategory; 7] = [
        Self::Auto,
        Self::CreativeOrientation,
        Self::TechnicalAnalysis,
        Self::StructuralThinking,
        Self::Conversation,
        Self::RagRetrieval,
        Self::DataProcessing,
    ];

    /// Stable kebab-case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::CreativeOrientation => "creative-orientation",
            Self::TechnicalAnalysis => "technical-analysis",
            Self::StructuralThinking => "structural-thinking",
            Self::Conversation => "conversation",
            Self::RagRetrieval => "rag-retrieval",
            Self::DataProcessing => "data-processing",
        }
    }

    /// Tie-break rank (higher wins)
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Self::CreativeOrientation => 6,
            Self::TechnicalAnalysis => 5,
            Self::StructuralThinking => 4,
            Self::RagRetrieval => 3,
            Self::DataProcessing => 2,
            Self::Conversation => 1,
            Self::Auto => 0,
        }
    }

    /// Capability tag a flow must declare to serve this category
    #[must_use]
    pub fn expected_capability(&self) -> Option<&'static str> {
        match self {
            Self::CreativeOrientation => Some("creative"),
            Self::TechnicalAnalysis => Some("analysis"),
            Self::StructuralThinking => Some("structure"),
            Self::Conversation => Some("chat"),
            Self::RagRetrieval => Some("rag"),
            Self::DataProcessing => Some("data"),
            Self::Auto => None,
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown intent category: {}", s))
    }
}

/// Result of classifying a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Winning category
    pub category: IntentCategory,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Keywords of the winning category found in the query, in query order
    pub matched_keywords: Vec<String>,
}

impl IntentResult {
    /// The default classification when nothing matches
    #[must_use]
    pub fn default_conversation() -> Self {
        Self {
            category: IntentCategory::Conversation,
            confidence: 0.0,
            matched_keywords: Vec::new(),
        }
    }

    /// Result for a caller-supplied intent
    #[must_use]
    pub fn explicit(category: IntentCategory) -> Self {
        Self {
            category,
            confidence: 1.0,
            matched_keywords: Vec::new(),
        }
    }

    /// Whether this is the no-match default
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.category == IntentCategory::Conversation && self.confidence == 0.0
    }
}

#[derive(Debug, Clone)]
struct CategoryTable {
    category: IntentCategory,
    /// Each keyword pre-split into tokens
    keywords: Vec<(String, Vec<String>)>,
    normalization: f64,
}

/// Keyword-table intent classifier
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    tables: Vec<CategoryTable>,
    max_input_length: usize,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a classifier with the built-in keyword tables
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&IntentConfig::default())
    }

    /// Create a classifier, replacing built-in tables where the config provides them
    #[must_use]
    pub fn from_config(config: &IntentConfig) -> Self {
        let tables = IntentCategory::ALL
            .into_iter()
            .filter(|c| *c != IntentCategory::Auto)
            .map(|category| {
                let (defaults, default_norm) = keywords::default_table(category);
                let words: Vec<String> = match config.keywords.get(&category) {
                    Some(custom) => custom.clone(),
                    None => defaults.iter().map(|k| k.to_string()).collect(),
                };
                let normalization = config
                    .normalization
                    .get(&category)
                    .copied()
                    .filter(|n| *n > 0.0)
                    .unwrap_or(default_norm);

                let mut keywords: Vec<(String, Vec<String>)> = Vec::new();
                for word in words {
                    let lowered = word.trim().to_lowercase();
                    let parts = tokenize(&lowered);
                    if parts.is_empty() || keywords.iter().any(|(k, _)| *k == lowered) {
                        continue;
                    }
                    keywords.push((lowered, parts));
                }

                CategoryTable {
                    category,
                    keywords,
                    normalization,
                }
            })
            .collect();

        Self {
            tables,
            max_input_length: config.max_input_length,
        }
    }

    /// Classify a query
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub fn classify(&self, query: &str) -> IntentResult {
        if query.len() > self.max_input_length {
            debug!(
                "Query too long ({} > {}), using default classification",
                query.len(),
                self.max_input_length
            );
            return IntentResult::default_conversation();
        }

        let tokens = tokenize(&query.to_lowercase());
        let mut best: Option<IntentResult> = None;

        for table in &self.tables {
            let matched = match_keywords(table, &tokens);
            if matched.is_empty() {
                continue;
            }

            let confidence = (matched.len() as f64 / table.normalization).min(1.0);
            let candidate = IntentResult {
                category: table.category,
                confidence,
                matched_keywords: matched,
            };

            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let wins = candidate.confidence > current.confidence
                        || (candidate.confidence == current.confidence
                            && candidate.category.priority() > current.category.priority());
                    Some(if wins { candidate } else { current })
                }
            };
        }

        let result = best.unwrap_or_else(IntentResult::default_conversation);
        debug!(
            category = %result.category,
            confidence = result.confidence,
            matched = ?result.matched_keywords,
            "Classified query"
        );
        result
    }

    /// Classify unless the caller supplied an intent
    #[must_use]
    pub fn resolve(&self, query: &str, explicit: Option<IntentCategory>) -> IntentResult {
        match explicit {
            Some(category) => IntentResult::explicit(category),
            None => self.classify(query),
        }
    }

    /// Keywords configured for a category
    #[must_use]
    pub fn keywords_for(&self, category: IntentCategory) -> Vec<&str> {
        self.tables
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.keywords.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Split lowercase text into alphanumeric tokens
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Distinct keywords of a table present in `tokens`, ordered by first occurrence
fn match_keywords(table: &CategoryTable, tokens: &[String]) -> Vec<String> {
    let mut hits: Vec<(usize, &str)> = table
        .keywords
        .iter()
        .filter_map(|(keyword, parts)| {
            tokens
                .windows(parts.len())
                .position(|w| w == parts.as_slice())
                .map(|pos| (pos, keyword.as_str()))
        })
        .collect();

    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, k)| k.to_string()).collect()
}
