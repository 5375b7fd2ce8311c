//! Conversation session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A conversation session correlating query/response turns under one id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID v4).
    pub session_id: String,

    /// Caller-supplied user id, never validated.
    pub user_id: Option<String>,

    /// When the session was created. Never changes.
    pub created_at: DateTime<Utc>,

    /// Last time a turn was recorded (or creation time). Drives eviction.
    #[serde(skip)]
    pub last_active_at: DateTime<Utc>,

    /// Turns in chronological order. Append-only.
    pub conversation_history: Vec<Turn>,
}

/// One query/response pair recorded within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    /// Original user text.
    pub query: String,

    /// Generated answer text.
    pub response: String,

    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with a fresh identifier.
    pub fn new(user_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            last_active_at: now,
            conversation_history: Vec::new(),
        }
    }

    /// Append a turn to the history.
    pub fn record_turn(&mut self, turn: Turn) {
        self.last_active_at = Utc::now();
        self.conversation_history.push(turn);
    }
}

impl Turn {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_get_distinct_ids() {
        let a = Session::new(None);
        let b = Session::new(Some("user-1".to_string()));
        assert_ne!(a.session_id, b.session_id);
        assert!(uuid::Uuid::parse_str(&a.session_id).is_ok());
        assert_eq!(b.user_id.as_deref(), Some("user-1"));
        assert!(a.conversation_history.is_empty());
    }

    #[test]
    fn record_turn_appends_in_order() {
        let mut session = Session::new(None);
        let created_at = session.created_at;
        session.record_turn(Turn::new("fees?", "1%"));
        session.record_turn(Turn::new("limit?", "$10k"));

        let queries: Vec<&str> = session
            .conversation_history
            .iter()
            .map(|t| t.query.as_str())
            .collect();
        assert_eq!(queries, vec!["fees?", "limit?"]);
        assert_eq!(session.created_at, created_at);
        assert!(session.last_active_at >= created_at);
    }
}
