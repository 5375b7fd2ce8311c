use crate::models::{Session, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CreateSessionParams {
    /// Optional user identifier to attach to the session.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub conversation_history: Vec<Turn>,
}

impl From<&Session> for SessionCreatedResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            created_at: session.created_at,
        }
    }
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            created_at: session.created_at,
            conversation_history: session.conversation_history,
        }
    }
}
