pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
use crate::middleware::metrics_middleware;
use crate::services::QueryService;

/// Service name reported by `/health` and `/`.
pub const SERVICE_NAME: &str = "query-gateway";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Customer Support Query Gateway",
        description = "Session-aware question answering over a retrieval-augmented language model"
    ),
    paths(
        handlers::query::submit_query,
        handlers::session::create_session,
        handlers::session::get_session,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::root,
    ),
    components(
        schemas(
            dtos::QueryRequest,
            dtos::QueryResponse,
            dtos::SessionCreatedResponse,
            dtos::SessionResponse,
            dtos::HealthResponse,
            dtos::HealthStatus,
            dtos::ServiceInfo,
            models::Turn,
        )
    ),
    tags(
        (name = "Query", description = "Question answering"),
        (name = "Session", description = "Conversation sessions"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub query_service: QueryService,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/api/v1/query", post(handlers::submit_query))
        .route("/api/v1/session", post(handlers::create_session))
        .route("/api/v1/session/:session_id", get(handlers::get_session))
        .route_layer(from_fn(metrics_middleware))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}
