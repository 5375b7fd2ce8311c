//! Query gateway business logic.
//!
//! Owns the session lifecycle around each adapter call: history is read
//! before the call, and the session is only created or extended once the
//! adapter has produced an answer.

use crate::dtos::{
    HealthStatus, QueryRequest, QueryResponse, SessionCreatedResponse, SessionResponse,
};
use crate::models::Turn;
use crate::services::metrics;
use crate::services::rag::RagAdapter;
use crate::services::session_store::SessionStore;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Clone)]
pub struct QueryService {
    sessions: Arc<dyn SessionStore>,
    /// `None` when the adapter failed to initialize; queries then fail with 503.
    adapter: Option<Arc<dyn RagAdapter>>,
}

impl QueryService {
    pub fn new(sessions: Arc<dyn SessionStore>, adapter: Option<Arc<dyn RagAdapter>>) -> Self {
        Self { sessions, adapter }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Label of the active backend, if any.
    pub fn provider(&self) -> Option<&'static str> {
        self.adapter.as_ref().map(|a| a.provider())
    }

    /// Answer a validated query and record it in its session.
    pub async fn submit_query(&self, request: QueryRequest) -> Result<QueryResponse, AppError> {
        let started = Instant::now();

        let Some(adapter) = self.adapter.as_ref() else {
            metrics::record_query("unavailable");
            return Err(AppError::ServiceUnavailable(
                "Chat service is not initialized".to_string(),
            ));
        };

        let query_id = Uuid::new_v4().to_string();

        let existing = match request.session_id.as_deref() {
            Some(session_id) => self.sessions.get(session_id).await?,
            None => None,
        };
        if let (Some(requested), None) = (request.session_id.as_deref(), existing.as_ref()) {
            tracing::info!(
                query_id = %query_id,
                requested_session_id = %requested,
                "Unknown session id, a new session will be created"
            );
        }

        let history: &[Turn] = existing
            .as_ref()
            .map(|s| s.conversation_history.as_slice())
            .unwrap_or_default();

        tracing::info!(
            query_id = %query_id,
            session_id = existing.as_ref().map(|s| s.session_id.as_str()).unwrap_or("new"),
            query_chars = request.query.chars().count(),
            history_turns = history.len(),
            "Processing query"
        );

        let adapter_started = Instant::now();
        let outcome = adapter.generate(&request.query, history).await;
        metrics::record_adapter_latency(adapter.provider(), adapter_started.elapsed().as_secs_f64());

        let answer = match outcome {
            Ok(answer) => answer,
            Err(e) => {
                metrics::record_adapter_error(adapter.provider(), e.kind());
                // provider detail stays in the logs; clients get a fixed message
                if e.is_unavailable() {
                    tracing::warn!(query_id = %query_id, error = %e, "Adapter unavailable");
                    metrics::record_query("unavailable");
                    return Err(AppError::ServiceUnavailable(
                        "Chat service is unavailable".to_string(),
                    ));
                }
                tracing::error!(query_id = %query_id, error = %e, "Adapter failed");
                metrics::record_query("error");
                return Err(AppError::InternalError(anyhow::anyhow!(
                    "Error processing query {}",
                    query_id
                )));
            }
        };

        let turn = Turn::new(request.query.clone(), answer.clone());
        let timestamp = turn.timestamp;
        let existing_id = existing.map(|s| s.session_id);
        let session_id = self
            .record_turn(existing_id, request.user_id, turn)
            .await?;

        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        metrics::record_query("ok");

        tracing::info!(
            query_id = %query_id,
            session_id = %session_id,
            processing_time_ms,
            "Query processed"
        );

        Ok(QueryResponse {
            query_id,
            session_id,
            query: request.query,
            response: answer,
            confidence: None,
            source_documents: None,
            timestamp,
            processing_time_ms,
        })
    }

    /// Append `turn` to the session, minting a new one if it is missing.
    async fn record_turn(
        &self,
        session_id: Option<String>,
        user_id: Option<String>,
        turn: Turn,
    ) -> Result<String, AppError> {
        if let Some(session_id) = session_id {
            match self.sessions.append(&session_id, turn.clone()).await {
                Ok(_) => return Ok(session_id),
                // evicted while the adapter was running
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(session_id = %session_id, "Session vanished during query");
                }
                Err(e) => return Err(e),
            }
        }

        let session = self.sessions.create_with_turn(user_id, turn).await?;
        Ok(session.session_id)
    }

    pub async fn create_session(
        &self,
        user_id: Option<String>,
    ) -> Result<SessionCreatedResponse, AppError> {
        let session = self.sessions.create(user_id).await?;
        Ok(SessionCreatedResponse::from(&session))
    }

    pub async fn get_session(&self, session_id: &str) -> Result<SessionResponse, AppError> {
        self.sessions
            .get(session_id)
            .await?
            .map(SessionResponse::from)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))
    }

    /// `Ok` iff the adapter exists and reports healthy.
    pub async fn health(&self) -> HealthStatus {
        let Some(adapter) = self.adapter.as_ref() else {
            return HealthStatus::Degraded;
        };

        match adapter.health_check().await {
            Ok(()) => HealthStatus::Ok,
            Err(e) => {
                tracing::warn!(provider = adapter.provider(), error = %e, "Adapter health check failed");
                HealthStatus::Degraded
            }
        }
    }
}
