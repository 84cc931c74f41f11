//! Failure-tolerant session persistence
//!
//! Store outages and malformed entries never reach the caller: reads degrade
//! to "no session", writes report `false`, and everything is logged.

use super::kv::KvStore;
use super::{Session, SESSION_SCHEMA_VERSION};
use crate::config::SessionConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Key namespace (below the prefix) holding archived sessions
const ARCHIVE_NAMESPACE: &str = "archive:";

/// Loads and saves [`Session`] values through a [`KvStore`]
#[derive(Clone)]
pub struct SessionStoreAdapter {
    store: Arc<dyn KvStore>,
    key_prefix: String,
    ttl: Duration,
}

impl SessionStoreAdapter {
    /// Create an adapter using the configured prefix and TTL
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            ttl: config.ttl(),
        }
    }

    /// Key under which a session id is stored
    #[must_use]
    pub fn key_for(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }

    fn archive_key(&self, session_id: &str) -> String {
        format!(
            "{}{}{}:{}:{}",
            self.key_prefix,
            ARCHIVE_NAMESPACE,
            session_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        )
    }

    /// Load a session; missing, unreadable and malformed entries all yield `None`
    #[instrument(skip(self))]
    pub async fn load(&self, session_id: &str) -> Option<Session> {
        let key = self.key_for(session_id);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Session load failed, continuing without it");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                if session.schema_version > SESSION_SCHEMA_VERSION {
                    debug!(
                        session_id = %session_id,
                        version = session.schema_version,
                        "Session written by a newer schema"
                    );
                }
                Some(session)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Malformed session entry ignored");
                None
            }
        }
    }

    /// Persist a session, refreshing its TTL
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn save(&self, session: &Session) -> bool {
        self.write(&self.key_for(&session.id), session).await
    }

    /// Store a closed copy of the session under the archive namespace
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn archive(&self, session: &Session) -> bool {
        self.write(&self.archive_key(&session.id), &session.closed())
            .await
    }

    async fn write(&self, key: &str, session: &Session) -> bool {
        let json = match serde_json::to_string(session) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Session serialization failed");
                return false;
            }
        };

        match self.store.set_with_ttl(key, &json, self.ttl).await {
            Ok(()) => {
                debug!(key = %key, ttl_secs = self.ttl.as_secs(), "Session saved");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Session save failed, session stays transient");
                false
            }
        }
    }

    /// Ids of live sessions matching a glob over the id (archives excluded)
    pub async fn list(&self, pattern: &str) -> Vec<String> {
        let glob = format!("{}{}", self.key_prefix, pattern);
        match self.store.scan(&glob).await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&self.key_prefix).map(str::to_string))
                .filter(|id| !id.starts_with(ARCHIVE_NAMESPACE))
                .collect(),
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Session listing failed");
                Vec::new()
            }
        }
    }

    /// Remove a session, returning whether it existed
    pub async fn delete(&self, session_id: &str) -> bool {
        match self.store.delete(&self.key_for(session_id)).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Session delete failed");
                false
            }
        }
    }

    /// Archived copies of a session, oldest first
    pub async fn archived(&self, session_id: &str) -> Vec<Session> {
        let glob = format!("{}{}{}:*", self.key_prefix, ARCHIVE_NAMESPACE, session_id);
        let keys = match self.store.scan(&glob).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Archive listing failed");
                return Vec::new();
            }
        };

        let mut sessions = Vec::with_capacity(keys.len());
        for key in keys {
            if let Ok(Some(raw)) = self.store.get(&key).await {
                if let Ok(session) = serde_json::from_str::<Session>(&raw) {
                    sessions.push(session);
                }
            }
        }
        sessions
    }
}
