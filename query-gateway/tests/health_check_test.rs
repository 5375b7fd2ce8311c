//! Health, readiness and metadata endpoint tests.

mod common;

use common::TestApp;
use query_gateway::config::LlmProvider;
use std::path::PathBuf;

#[tokio::test]
async fn health_check_reports_ok_with_mock_provider() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "query-gateway");
    assert_eq!(body["provider"], "mock");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_is_degraded_but_200_without_adapter() {
    let app = TestApp::spawn_with_provider(None).await;

    let response = app
        .client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert!(body.get("provider").is_none());

    let ready = app
        .client()
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), 503);
}

#[tokio::test]
async fn ready_when_adapter_initialized() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn build_from_config_initializes_mock_adapter() {
    let app = TestApp::spawn_from_config(|config| config.llm.provider = LlmProvider::Mock).await;

    let body: serde_json::Value = app
        .client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_knowledge_base_or_key_leaves_service_degraded() {
    let missing_corpus = TestApp::spawn_from_config(|config| {
        config.rag.knowledge_base_path = PathBuf::from("/nonexistent/knowledge_base.txt");
    })
    .await;
    let missing_key =
        TestApp::spawn_from_config(|config| config.llm.provider = LlmProvider::OpenAi).await;

    for app in [&missing_corpus, &missing_key] {
        let body: serde_json::Value = app
            .client()
            .get(format!("{}/health", app.address))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "degraded");

        let response = app.post_query(serde_json::json!({"query": "fees?"})).await;
        assert_eq!(response.status(), 503);
    }
}

#[tokio::test]
async fn root_describes_service() {
    let app = TestApp::spawn().await;

    let body: serde_json::Value = app
        .client()
        .get(&app.address)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["service"], "query-gateway");
    assert_eq!(body["docs"], "/docs");
    assert_eq!(body["openapi"], "/openapi.json");
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = TestApp::spawn().await;

    let response = app
        .client()
        .get(format!("{}/openapi.json", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["paths"]["/api/v1/query"]["post"].is_object());
    assert!(body["paths"]["/api/v1/session/{session_id}"]["get"].is_object());
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    query_gateway::services::metrics::init_metrics();
    let app = TestApp::spawn().await;

    app.post_query(serde_json::json!({"query": "fees?"})).await;

    let response = app
        .client()
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert!(body.contains("gateway_queries_total"));
    assert!(body.contains("http_requests_total"));
}
