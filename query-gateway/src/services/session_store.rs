//! Session storage.
//!
//! The gateway only talks to [`SessionStore`], so a shared external store can
//! replace the in-process map without touching request handling.

use crate::models::{Session, Turn};
use crate::services::metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use service_core::error::AppError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new empty session and return it.
    async fn create(&self, user_id: Option<String>) -> Result<Session, AppError>;

    /// Insert a new session already holding `turn`, in one step, so capacity
    /// eviction can never separate the session from its first turn.
    async fn create_with_turn(
        &self,
        user_id: Option<String>,
        turn: Turn,
    ) -> Result<Session, AppError>;

    /// Snapshot of a session, `None` if unknown.
    async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError>;

    /// Append a turn to an existing session, returning the new history length.
    ///
    /// Appends to the same session are serialized. Fails with
    /// `AppError::NotFound` if the session does not exist.
    async fn append(&self, session_id: &str, turn: Turn) -> Result<usize, AppError>;

    /// Number of sessions currently held.
    async fn len(&self) -> usize;

    /// Remove sessions whose last activity is older than `cutoff`.
    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize;
}

/// Process-local session store.
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
    /// 0 means unbounded.
    max_sessions: usize,
}

impl InMemorySessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
        }
    }

    /// Make room if bounded, then store `session`.
    fn insert(&self, session: Session) -> Session {
        if self.max_sessions > 0 {
            while self.sessions.len() >= self.max_sessions {
                self.evict_lru();
            }
        }

        self.sessions
            .insert(session.session_id.clone(), session.clone());
        metrics::set_sessions_active(self.sessions.len());

        tracing::info!(session_id = %session.session_id, "Created session");
        session
    }

    /// Drop the least recently active session.
    fn evict_lru(&self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.value().last_active_at)
            .map(|entry| entry.key().clone());

        if let Some(session_id) = oldest {
            if self.sessions.remove(&session_id).is_some() {
                tracing::info!(session_id = %session_id, "Evicted session at capacity");
                metrics::record_sessions_evicted("capacity", 1);
            }
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: Option<String>) -> Result<Session, AppError> {
        Ok(self.insert(Session::new(user_id)))
    }

    async fn create_with_turn(
        &self,
        user_id: Option<String>,
        turn: Turn,
    ) -> Result<Session, AppError> {
        let mut session = Session::new(user_id);
        session.record_turn(turn);
        Ok(self.insert(session))
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        Ok(self
            .sessions
            .get(session_id)
            .map(|entry| entry.value().clone()))
    }

    async fn append(&self, session_id: &str, turn: Turn) -> Result<usize, AppError> {
        // get_mut holds the shard write lock for the whole push
        match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                entry.record_turn(turn);
                Ok(entry.conversation_history.len())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!(
                "Session not found: {}",
                session_id
            ))),
        }
    }

    async fn len(&self) -> usize {
        self.sessions.len()
    }

    async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_active_at >= cutoff);
        let evicted = before.saturating_sub(self.sessions.len());

        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle sessions");
            metrics::record_sessions_evicted("idle", evicted);
        }
        metrics::set_sessions_active(self.sessions.len());
        evicted
    }
}
