//! Backend scoring - weighted suitability of (backend, flow) pairs.
//!
//! ```text
//! score = 0.40 * flow_match + 0.30 * health + 0.20 * performance + 0.10 * capability
//! ```
//!
//! Every factor lies in `[0, 1]`, so does the total. Candidates are ranked by
//! score, then flow match, then average latency (unknown last), then backend
//! registration order, then catalog order.


use crate::backend::Flow;
use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use crate::intent::{tokenize, IntentCategory, IntentResult};
use crate::registry::{BackendSnapshot, RegistrySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Neutral value for factors with no evidence either way
const NEUTRAL: f64 = 0.5;

/// Health of a connected backend that has no recent probe
const UNPROBED_HEALTH: f64 = 0.8;

/// Weights for the four scoring factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for flow/intent match (0.40)
    pub flow_match: f64,
    /// Weight for backend health (0.30)
    pub health: f64,
    /// Weight for historical performance (0.20)
    pub performance: f64,
    /// Weight for capability match (0.10)
    pub capability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            flow_match: 0.40,
            health: 0.30,
            performance: 0.20,
            capability: 0.10,
        }
    }
}

/// Per-factor scores, each in `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// How well the flow's keywords match the intent
    pub flow_match: f64,
    /// Backend connection and probe health
    pub health: f64,
    /// Backend success rate
    pub performance: f64,
    /// Whether the flow declares the intent's capability
    pub capability: f64,
}

impl ScoreBreakdown {
    /// Weighted sum of the factors
    #[must_use]
    pub fn total(&self, weights: &ScoringWeights) -> f64 {
        (weights.flow_match * self.flow_match
            + weights.health * self.health
            + weights.performance * self.performance
            + weights.capability * self.capability)
            .clamp(0.0, 1.0)
    }
}

/// A scored (backend, flow) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Backend hosting the flow
    pub backend_id: String,
    /// Flow id
    pub flow_id: String,
    /// Weighted total
    pub score: f64,
    /// Factor scores
    pub breakdown: ScoreBreakdown,
}

/// Which flow on which backend a query is sent to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Chosen backend
    pub backend_id: String,
    /// Chosen flow
    pub flow_id: String,
    /// Score of the chosen candidate
    pub score: f64,
    /// Factor scores of the chosen candidate
    pub breakdown: ScoreBreakdown,
    /// Remaining candidates, best first
    pub alternates: Vec<Candidate>,
    /// Whether this decision replaced a failed one
    pub fallback: bool,
}

impl RoutingDecision {
    /// Decision for the head of a ranked list, the rest become alternates
    #[must_use]
    pub fn from_ranked(ranked: Vec<Candidate>) -> Option<Self> {
        let mut iter = ranked.into_iter();
        let best = iter.next()?;
        Some(Self {
            backend_id: best.backend_id,
            flow_id: best.flow_id,
            score: best.score,
            breakdown: best.breakdown,
            alternates: iter.collect(),
            fallback: false,
        })
    }

    /// Mark as a fallback decision
    #[must_use]
    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// Ordering key beyond the public score fields
struct RankKey {
    avg_latency_ms: Option<f64>,
    backend_order: usize,
    flow_index: usize,
}

/// Scores and ranks routing candidates
#[derive(Debug, Clone, Default)]
pub struct BackendScorer {
    weights: ScoringWeights,
    config: ScoringConfig,
}

impl BackendScorer {
    /// Create a scorer with the standard weights
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            weights: ScoringWeights::default(),
            config,
        }
    }

    /// Weights in use
    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Factor scores of one flow on one backend
    #[must_use]
    pub fn breakdown(
        &self,
        intent: &IntentResult,
        backend: &BackendSnapshot,
        flow: &Flow,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            flow_match: flow_match(intent, flow),
            health: self.health(backend, now),
            performance: backend.performance.success_rate.unwrap_or(NEUTRAL),
            capability: capability_match(intent.category, backend, flow),
        }
    }

    /// Score a single pair
    #[must_use]
    pub fn score(
        &self,
        intent: &IntentResult,
        backend: &BackendSnapshot,
        flow: &Flow,
        now: DateTime<Utc>,
    ) -> Candidate {
        let breakdown = self.breakdown(intent, backend, flow, now);
        Candidate {
            backend_id: backend.id.clone(),
            flow_id: flow.id.clone(),
            score: breakdown.total(&self.weights),
            breakdown,
        }
    }

    /// Every flow of every backend in the snapshot, best first
    #[must_use]
    pub fn rank(&self, intent: &IntentResult, snapshot: &RegistrySnapshot) -> Vec<Candidate> {
        let now = snapshot.taken_at;
        let mut keyed: Vec<(RankKey, Candidate)> = snapshot
            .backends
            .iter()
            .flat_map(|backend| {
                backend.flows.iter().enumerate().map(move |(index, flow)| {
                    (
                        RankKey {
                            avg_latency_ms: backend.performance.avg_latency_ms,
                            backend_order: backend.order,
                            flow_index: index,
                        },
                        self.score(intent, backend, flow, now),
                    )
                })
            })
            .collect();

        keyed.sort_by(|(ka, a), (kb, b)| compare(ka, a, kb, b));

        let ranked: Vec<Candidate> = keyed.into_iter().map(|(_, c)| c).collect();
        debug!(
            intent = %intent.category,
            candidates = ranked.len(),
            best = ?ranked.first().map(|c| (&c.backend_id, &c.flow_id, c.score)),
            "Ranked candidates"
        );
        ranked
    }

    /// Best candidate plus ordered alternates
    pub fn decide(
        &self,
        intent: &IntentResult,
        snapshot: &RegistrySnapshot,
    ) -> Result<RoutingDecision> {
        RoutingDecision::from_ranked(self.rank(intent, snapshot)).ok_or_else(|| {
            Error::NoCandidates {
                intent: intent.category.to_string(),
            }
        })
    }

    fn health(&self, backend: &BackendSnapshot, now: DateTime<Utc>) -> f64 {
        if !backend.is_connected() {
            return 0.0;
        }

        let health = &backend.health;
        if health.healthy_within(self.config.health_recency(), now) {
            return 1.0;
        }
        if health.consecutive_failures > 0 {
            let limit = f64::from(self.config.max_consecutive_failures.max(1));
            return (1.0 - f64::from(health.consecutive_failures) / limit).max(0.0);
        }
        UNPROBED_HEALTH
    }
}

fn compare(ka: &RankKey, a: &Candidate, kb: &RankKey, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.breakdown.flow_match.total_cmp(&a.breakdown.flow_match))
        .then_with(|| match (ka.avg_latency_ms, kb.avg_latency_ms) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| ka.backend_order.cmp(&kb.backend_order))
        .then_with(|| ka.flow_index.cmp(&kb.flow_index))
}

/// Keyword relation between a flow and the classified intent
fn flow_match(intent: &IntentResult, flow: &Flow) -> f64 {
    let category = intent.category.as_str();
    let exact = flow.intent_keywords.iter().any(|keyword| {
        keyword.eq_ignore_ascii_case(category)
            || intent
                .matched_keywords
                .iter()
                .any(|m| m.eq_ignore_ascii_case(keyword))
    });
    if exact {
        return 1.0;
    }

    let flow_tokens: HashSet<String> = flow
        .intent_keywords
        .iter()
        .flat_map(|k| tokenize(&k.to_lowercase()))
        .collect();
    let intent_tokens: HashSet<String> = intent
        .matched_keywords
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(category))
        .flat_map(tokenize)
        .collect();

    let partial = if flow_tokens.is_empty() {
        0.0
    } else {
        let shared = flow_tokens.intersection(&intent_tokens).count();
        0.5 * shared as f64 / flow_tokens.len() as f64
    };

    if intent.category == IntentCategory::Auto {
        partial.max(NEUTRAL)
    } else {
        partial
    }
}

fn capability_match(category: IntentCategory, backend: &BackendSnapshot, flow: &Flow) -> f64 {
    let Some(tag) = category.expected_capability() else {
        return NEUTRAL;
    };
    let declared = flow.declares_capability(tag)
        || backend
            .capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(tag));
    if declared {
        1.0
    } else {
        0.0
    }
}
