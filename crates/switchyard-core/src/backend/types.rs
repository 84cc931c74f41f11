//! Core types for backends and flows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Backend identifier (unique within a registry)
pub type BackendId = String;

// ============================================================================
// Backend Kind
// ============================================================================

/// Workflow engine family a backend belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Langflow flow runner
    Langflow,
    /// Flowise chatflow server
    Flowise,
    /// n8n workflow automation
    N8n,
    /// Dify application platform
    Dify,
    /// Any engine speaking a plain request/response dialect
    Generic,
}

impl BackendKind {
    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Langflow => "langflow",
            Self::Flowise => "flowise",
            Self::N8n => "n8n",
            Self::Dify => "dify",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection Status
// ============================================================================

/// Connection state of a registered backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Registered but never connected
    Disconnected,
    /// Connect/discover in progress
    Connecting,
    /// Connected with a discovered catalog
    Connected,
    /// Last connect attempt failed
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// Static description of a backend, supplied at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Unique id
    pub id: BackendId,
    /// Human readable name (defaults to the id)
    #[serde(default)]
    pub name: String,
    /// Engine family
    pub kind: BackendKind,
    /// Base address of the engine
    pub base_url: String,
    /// Capabilities declared for the whole backend
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl BackendDescriptor {
    /// Create a descriptor whose name equals its id
    #[must_use]
    pub fn new(id: impl Into<String>, kind: BackendKind, base_url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            base_url: base_url.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare backend capabilities
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }
}

/// Last-known performance of a flow as reported by its backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowPerformance {
    /// Success score (0.0 - 1.0)
    #[serde(default)]
    pub success_score: f64,
    /// Engagement score (0.0 - 1.0)
    #[serde(default)]
    pub engagement_score: f64,
}

/// An executable workflow hosted by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Flow id (unique within its backend)
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Owning backend (lookup key, rewritten by the registry on discovery)
    #[serde(default)]
    pub backend_id: BackendId,
    /// Intent keywords the flow answers to
    #[serde(default)]
    pub intent_keywords: BTreeSet<String>,
    /// Declared capability tags
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    /// Accepted input type tags
    #[serde(default)]
    pub input_types: Vec<String>,
    /// Produced output type tags
    #[serde(default)]
    pub output_types: Vec<String>,
    /// Last-known performance snapshot
    #[serde(default)]
    pub performance: FlowPerformance,
}

impl Flow {
    /// Create a flow with no keywords or capabilities
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            backend_id: String::new(),
            intent_keywords: BTreeSet::new(),
            capabilities: BTreeSet::new(),
            input_types: vec!["text".to_string()],
            output_types: vec!["text".to_string()],
            performance: FlowPerformance::default(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set intent keywords (stored lowercase)
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intent_keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .collect();
        self
    }

    /// Set capability tags
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Set the performance snapshot
    #[must_use]
    pub fn with_performance(mut self, success_score: f64, engagement_score: f64) -> Self {
        self.performance = FlowPerformance {
            success_score,
            engagement_score,
        };
        self
    }

    /// Whether the flow declares the given capability tag
    #[must_use]
    pub fn declares_capability(&self, tag: &str) -> bool {
        self.capabilities.iter().any(|c| c.eq_ignore_ascii_case(tag))
    }
}

// ============================================================================
// Collaborator outcomes
// ============================================================================

/// Outcome of a connect call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionResult {
    /// Whether the backend accepted the connection
    pub connected: bool,
    /// Engine version, if reported
    pub version: Option<String>,
    /// Failure detail or informational message
    pub message: Option<String>,
}

impl ConnectionResult {
    /// Successful connection
    #[must_use]
    pub fn connected() -> Self {
        Self {
            connected: true,
            version: None,
            message: None,
        }
    }

    /// Failed connection
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            connected: false,
            version: None,
            message: Some(message.into()),
        }
    }
}

/// Outcome of a health probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the probe succeeded
    pub healthy: bool,
    /// Probe round-trip time
    pub latency_ms: Option<u64>,
    /// Failure detail
    pub message: Option<String>,
    /// When the probe completed
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    /// Healthy probe result
    #[must_use]
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency_ms),
            message: None,
            checked_at: Utc::now(),
        }
    }

    /// Failed probe result
    #[must_use]
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            latency_ms: None,
            message: Some(message.into()),
            checked_at: Utc::now(),
        }
    }
}

/// Outcome of executing a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the flow ran successfully
    pub success: bool,
    /// Output payload
    pub output: serde_json::Value,
    /// Wall-clock latency reported by the client
    pub latency_ms: u64,
    /// Backend-native session token to reuse on the next turn
    pub session_token: Option<String>,
    /// Failure detail
    pub error: Option<String>,
}

impl ExecutionOutcome {
    /// Successful execution
    #[must_use]
    pub fn success(output: serde_json::Value, latency_ms: u64) -> Self {
        Self {
            success: true,
            output,
            latency_ms,
            session_token: None,
            error: None,
        }
    }

    /// Failed execution
    #[must_use]
    pub fn failure(error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            latency_ms,
            session_token: None,
            error: Some(error.into()),
        }
    }

    /// Attach a backend session token
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}
