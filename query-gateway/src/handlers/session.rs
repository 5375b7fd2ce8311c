use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{CreateSessionParams, SessionCreatedResponse, SessionResponse},
    AppState,
};

/// Create a new conversation session
#[utoipa::path(
    post,
    path = "/api/v1/session",
    params(CreateSessionParams),
    responses(
        (status = 200, description = "Session created", body = SessionCreatedResponse)
    ),
    tag = "Session"
)]
pub async fn create_session(
    State(state): State<AppState>,
    Query(params): Query<CreateSessionParams>,
) -> Result<Json<SessionCreatedResponse>, AppError> {
    let session = state.query_service.create_session(params.user_id).await?;
    Ok(Json(session))
}

/// Get a session and its conversation history
#[utoipa::path(
    get,
    path = "/api/v1/session/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Session found", body = SessionResponse),
        (status = 404, description = "Session not found")
    ),
    tag = "Session"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.query_service.get_session(&session_id).await?;
    Ok(Json(session))
}
