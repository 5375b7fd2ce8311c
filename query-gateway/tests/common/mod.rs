//! Test helper for query-gateway integration tests.
//!
//! Spawns the real application on a random port with a temporary knowledge
//! base and a chosen text provider.

#![allow(dead_code)]

use async_trait::async_trait;
use query_gateway::config::{
    GatewayConfig, LlmConfig, LlmProvider, RagConfig, SessionConfig, VectorStoreKind,
};
use query_gateway::services::providers::mock::MockTextProvider;
use query_gateway::services::providers::{
    ChatMessage, ProviderError, ProviderResponse, TextProvider,
};
use query_gateway::services::{KnowledgeBase, KnowledgeRagAdapter, RagAdapter, SessionStore};
use query_gateway::startup::Application;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

pub const TEST_CORPUS: &str = "\
Domestic transfers cost 0.5% per transaction with a minimum fee of 0.20.

International transfers cost 1.5% plus a fixed fee of 2.00.

To reset your password, open Settings, choose Security and select Reset password.";

/// Provider that always fails with the error produced by `make_error`.
pub struct FailingProvider {
    make_error: fn() -> ProviderError,
}

impl FailingProvider {
    pub fn new(make_error: fn() -> ProviderError) -> Self {
        Self { make_error }
    }
}

#[async_trait]
impl TextProvider for FailingProvider {
    async fn generate(
        &self,
        _system_prompt: &str,
        _messages: &[ChatMessage],
    ) -> Result<ProviderResponse, ProviderError> {
        Err((self.make_error)())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// The running application's session store.
    pub sessions: Arc<dyn SessionStore>,
    client: reqwest::Client,
    _knowledge_file: NamedTempFile,
}

impl TestApp {
    /// Spawn with the deterministic mock provider.
    pub async fn spawn() -> Self {
        Self::spawn_with_provider(Some(Arc::new(MockTextProvider::new(true)))).await
    }

    /// Spawn with a mock provider that sleeps before answering.
    pub async fn spawn_slow(delay: Duration) -> Self {
        Self::spawn_with_provider(Some(Arc::new(MockTextProvider::new(true).with_delay(delay))))
            .await
    }

    /// Spawn with the given provider; `None` leaves the adapter uninitialized.
    pub async fn spawn_with_provider(provider: Option<Arc<dyn TextProvider>>) -> Self {
        let knowledge_file = write_corpus(TEST_CORPUS);
        let config = test_config(knowledge_file.path().to_path_buf());

        let adapter = provider.map(|provider| {
            let knowledge = KnowledgeBase::from_text(
                TEST_CORPUS,
                config.rag.chunk_size,
                config.rag.chunk_overlap,
            )
            .expect("Failed to index test corpus");
            Arc::new(KnowledgeRagAdapter::new(
                Arc::new(knowledge),
                provider,
                config.rag.top_k,
                config.rag.history_turns,
            )) as Arc<dyn RagAdapter>
        });

        let app = Application::build_with_adapter(config, adapter)
            .await
            .expect("Failed to build application");
        Self::start(app, knowledge_file)
    }

    /// Spawn through `Application::build`, exercising adapter construction
    /// from configuration.
    pub async fn spawn_from_config(configure: impl FnOnce(&mut GatewayConfig)) -> Self {
        let knowledge_file = write_corpus(TEST_CORPUS);
        let mut config = test_config(knowledge_file.path().to_path_buf());
        configure(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        Self::start(app, knowledge_file)
    }

    fn start(app: Application, knowledge_file: NamedTempFile) -> Self {
        let port = app.port();
        let sessions = app.state().query_service.sessions().clone();
        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            sessions,
            client: reqwest::Client::new(),
            _knowledge_file: knowledge_file,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn post_query(&self, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/v1/query", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_session(&self, user_id: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(format!("{}/api/v1/session", self.address));
        if let Some(user_id) = user_id {
            request = request.query(&[("user_id", user_id)]);
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn get_session(&self, session_id: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/api/v1/session/{}", self.address, session_id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// History length of a session, panicking if it does not exist.
    pub async fn history_len(&self, session_id: &str) -> usize {
        let response = self.get_session(session_id).await;
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        body["conversation_history"].as_array().unwrap().len()
    }
}

pub fn test_config(knowledge_base_path: std::path::PathBuf) -> GatewayConfig {
    GatewayConfig {
        common: service_core::config::Config { port: 0 },
        llm: LlmConfig {
            provider: LlmProvider::Mock,
            api_key: None,
            model: "mock-model".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(5),
        },
        rag: RagConfig {
            knowledge_base_path,
            vector_store: VectorStoreKind::Memory,
            chunk_size: 512,
            chunk_overlap: 50,
            top_k: 3,
            history_turns: 5,
        },
        sessions: SessionConfig {
            max_sessions: 0,
            idle_timeout: None,
        },
    }
}

fn write_corpus(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create knowledge base file");
    file.write_all(text.as_bytes())
        .expect("Failed to write knowledge base file");
    file
}
