//! Session state and persistence.
//!
//! A [`Session`] carries one conversation across turns: the backend it is
//! bound to, that backend's opaque session token, free-form context and an
//! append-only history. Sessions are plain values; the router loads one,
//! mutates its local copy and persists it whole through the
//! [`SessionStoreAdapter`].
//!
//! # Storage
//!
//! - [`MemoryKvStore`] - in-process, lost on restart
//! - [`RedisKvStore`] - Redis with server-side TTL expiry
//!
//! Both implement [`KvStore`]; any other store can be plugged in the same way.

mod adapter;
mod kv;
mod memory;
mod redis_store;


pub use adapter::SessionStoreAdapter;
pub use kv::{KvStore, StoreError};
pub use memory::MemoryKvStore;
pub use redis_store::RedisKvStore;

#[cfg(test)]
pub use kv::MockKvStore;

use crate::backend::BackendId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Version written into every persisted session envelope
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// In use
    #[default]
    Active,
    /// No recent activity
    Idle,
    /// Past its time-to-live
    Expired,
    /// Ended (archived after a backend switch)
    Closed,
}

/// Who produced a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    /// The caller's query
    User,
    /// A backend's answer
    Assistant,
    /// Routing notes (failed attempts, backend switches)
    System,
}

/// One history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Author
    pub role: HistoryRole,
    /// Text content
    pub content: String,
    /// When the entry was appended
    pub timestamp: DateTime<Utc>,
}

/// Session bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last time an entry was appended
    pub last_active_at: DateTime<Utc>,
    /// Entries appended so far
    #[serde(default)]
    pub message_count: u64,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_active_at: now,
            message_count: 0,
        }
    }
}

/// Conversation state persisted between turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Envelope version
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Session id
    pub id: String,
    /// Backend the session is bound to (set by the first successful execution)
    #[serde(default)]
    pub backend_id: Option<BackendId>,
    /// Backend-native session token
    #[serde(default)]
    pub backend_session_token: Option<String>,
    /// Lifecycle state
    #[serde(default)]
    pub status: SessionStatus,
    /// Flow that served the last successful turn
    #[serde(default)]
    pub current_flow_id: Option<String>,
    /// Caller-supplied context
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    /// Append-only history
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Bookkeeping
    #[serde(default)]
    pub metadata: SessionMetadata,
}

fn default_schema_version() -> u32 {
    SESSION_SCHEMA_VERSION
}

impl Session {
    /// Create an active session with a random id
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Create an active session with the given id
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            schema_version: SESSION_SCHEMA_VERSION,
            id: id.into(),
            backend_id: None,
            backend_session_token: None,
            status: SessionStatus::Active,
            current_flow_id: None,
            context: BTreeMap::new(),
            history: Vec::new(),
            metadata: SessionMetadata::default(),
        }
    }

    /// Append a history entry
    pub fn push(&mut self, role: HistoryRole, content: impl Into<String>) {
        let now = Utc::now();
        self.history.push(HistoryEntry {
            role,
            content: content.into(),
            timestamp: now,
        });
        self.metadata.message_count += 1;
        self.metadata.last_active_at = now;
    }

    /// Whether the session is bound to a backend other than `backend_id`
    #[must_use]
    pub fn is_bound_elsewhere(&self, backend_id: &str) -> bool {
        self.backend_id.as_deref().is_some_and(|b| b != backend_id)
    }

    /// Token to hand to `backend_id`, only if the session belongs to it
    #[must_use]
    pub fn token_for(&self, backend_id: &str) -> Option<&str> {
        if self.backend_id.as_deref() == Some(backend_id) {
            self.backend_session_token.as_deref()
        } else {
            None
        }
    }

    /// New session value bound to another backend
    ///
    /// Id, context and history carry over; the backend token does not. `self`
    /// is left untouched for archiving.
    #[must_use]
    pub fn rebind(&self, backend_id: impl Into<String>) -> Session {
        let backend_id = backend_id.into();
        let mut next = self.clone();
        next.push(
            HistoryRole::System,
            format!(
                "session moved from backend '{}' to '{}'",
                self.backend_id.as_deref().unwrap_or("none"),
                backend_id
            ),
        );
        next.backend_id = Some(backend_id);
        next.backend_session_token = None;
        next.current_flow_id = None;
        next.status = SessionStatus::Active;
        next
    }

    /// Copy of the session in the `closed` state
    #[must_use]
    pub fn closed(&self) -> Session {
        let mut closed = self.clone();
        closed.status = SessionStatus::Closed;
        closed
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
