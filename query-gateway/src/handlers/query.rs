use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{QueryRequest, QueryResponse},
    utils::ValidatedJson,
    AppState,
};

/// Submit a query and receive a generated answer
#[utoipa::path(
    post,
    path = "/api/v1/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Answer generated", body = QueryResponse),
        (status = 400, description = "Missing or invalid query"),
        (status = 503, description = "Chat service is not available"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Query"
)]
pub async fn submit_query(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let response = state.query_service.submit_query(req).await?;
    Ok(Json(response))
}
