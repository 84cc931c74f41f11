//! Error types for switchyard-core
//!
//! Only routing outcomes a caller can act on surface as [`Error`]. Persistence
//! and observability problems are absorbed where they happen and only logged.

use crate::router::Attempt;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No flow is available on any eligible backend
    #[error("no routing candidates for intent '{intent}'")]
    NoCandidates {
        /// Intent category the query was classified as
        intent: String,
    },

    /// An explicit backend/flow override does not resolve to a registered
    /// backend hosting that flow
    #[error("backend not found: {0}")]
    BackendNotFound(String),

    /// A backend with the same id or name is already registered
    #[error("backend already registered: {0}")]
    DuplicateBackend(String),

    /// Every candidate failed to execute
    #[error("execution failed on all {} candidate(s): {last_error}", attempts.len())]
    ExecutionFailed {
        /// Attempts in the order they were made
        attempts: Vec<Attempt>,
        /// Error reported by the last attempt
        last_error: String,
    },

    /// Connecting to or discovering a backend failed
    #[error("connection to backend '{backend}' failed: {message}")]
    Connection {
        /// Backend id
        backend: String,
        /// Collaborator message
        message: String,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error (serialization, invariant violations)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Backends attempted before giving up, each listed once in attempt order
    #[must_use]
    pub fn attempted_backends(&self) -> Vec<&str> {
        let Error::ExecutionFailed { attempts, .. } = self else {
            return Vec::new();
        };

        let mut seen: Vec<&str> = Vec::with_capacity(attempts.len());
        for attempt in attempts {
            if !seen.contains(&attempt.backend_id.as_str()) {
                seen.push(&attempt.backend_id);
            }
        }
        seen
    }

    /// Whether the error is a user-visible routing failure
    #[must_use]
    pub fn is_routing_failure(&self) -> bool {
        matches!(
            self,
            Error::NoCandidates { .. }
                | Error::BackendNotFound(_)
                | Error::ExecutionFailed { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::NoCandidates { intent } => {
                format!("No workflow is available to handle a '{}' request.", intent)
            }
            Error::BackendNotFound(name) => format!("Backend '{}' is not registered.", name),
            Error::DuplicateBackend(name) => {
                format!("Backend '{}' is already registered.", name)
            }
            Error::ExecutionFailed { last_error, .. } => {
                let tried = self.attempted_backends().join(", ");
                format!(
                    "Every backend failed to answer (tried: {}). Last error: {}",
                    tried, last_error
                )
            }
            Error::Connection { backend, message } => {
                format!("Could not connect to backend '{}': {}", backend, message)
            }
            Error::Configuration(msg) => format!("Configuration error: {}", msg),
            Error::Internal(msg) => format!("Internal error: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::NoCandidates { .. } => Some(
                "Connect at least one backend and make sure it exposes flows.".to_string(),
            ),
            Error::BackendNotFound(_) => Some(
                "Check the backend name and flow id, or register the backend first.".to_string(),
            ),
            Error::ExecutionFailed { .. } => {
                Some("Check backend health and retry the query.".to_string())
            }
            Error::Connection { .. } => {
                Some("Verify the backend address and that it is running.".to_string())
            }
            Error::Configuration(_) => {
                Some("Check config/default.toml or SWITCHYARD_* variables.".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
