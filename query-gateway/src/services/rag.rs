//! Retrieval-augmented generation adapter.
//!
//! The gateway sees only [`RagAdapter`]; retrieval and the model backend stay
//! behind it.

use crate::config::{GatewayConfig, VectorStoreKind};
use crate::models::Turn;
use crate::services::knowledge::KnowledgeBase;
use crate::services::providers::{build_text_provider, ChatMessage, ProviderError, TextProvider};
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;

const SYSTEM_PROMPT: &str = "You are an expert customer support agent. \
Answer the user's question based ONLY on the provided context. \
If the context does not contain the answer, politely state that you do not have the information.";

#[async_trait]
pub trait RagAdapter: Send + Sync {
    /// Answer `query` given the prior turns of the conversation, oldest first.
    async fn generate(&self, query: &str, history: &[Turn]) -> Result<String, ProviderError>;

    /// Whether the adapter can currently serve queries.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Backend label used in logs, metrics and the health payload.
    fn provider(&self) -> &'static str;
}

/// Adapter grounding a chat model in the static knowledge base.
pub struct KnowledgeRagAdapter {
    knowledge: Arc<KnowledgeBase>,
    text_provider: Arc<dyn TextProvider>,
    top_k: usize,
    history_turns: usize,
}

impl KnowledgeRagAdapter {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        text_provider: Arc<dyn TextProvider>,
        top_k: usize,
        history_turns: usize,
    ) -> Self {
        Self {
            knowledge,
            text_provider,
            top_k,
            history_turns,
        }
    }

    /// Load the knowledge base and connect the configured provider.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, AppError> {
        let knowledge = match config.rag.vector_store {
            VectorStoreKind::Memory => {
                KnowledgeBase::load(
                    &config.rag.knowledge_base_path,
                    config.rag.chunk_size,
                    config.rag.chunk_overlap,
                )
                .await?
            }
        };

        let text_provider = build_text_provider(&config.llm)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            embedding_model = %config.llm.embedding_model,
            top_k = config.rag.top_k,
            "Initialized retrieval-augmented adapter"
        );

        Ok(Self::new(
            Arc::new(knowledge),
            text_provider,
            config.rag.top_k,
            config.rag.history_turns,
        ))
    }

    fn build_system_prompt(&self, query: &str) -> String {
        let hits = self.knowledge.search(query, self.top_k);
        tracing::debug!(retrieved = hits.len(), "Retrieved context chunks");

        let mut prompt = String::from(SYSTEM_PROMPT);
        prompt.push_str("\n\nContext:\n");
        if hits.is_empty() {
            prompt.push_str("(no relevant context found)\n");
        }
        for (i, hit) in hits.iter().enumerate() {
            prompt.push_str(&format!("[{}] {}\n", i + 1, hit.chunk.text));
        }
        prompt
    }

    fn build_messages(&self, query: &str, history: &[Turn]) -> Vec<ChatMessage> {
        let start = history.len().saturating_sub(self.history_turns);
        let mut messages: Vec<ChatMessage> = history[start..]
            .iter()
            .flat_map(|turn| {
                [
                    ChatMessage::user(turn.query.clone()),
                    ChatMessage::assistant(turn.response.clone()),
                ]
            })
            .collect();
        messages.push(ChatMessage::user(query));
        messages
    }
}

#[async_trait]
impl RagAdapter for KnowledgeRagAdapter {
    async fn generate(&self, query: &str, history: &[Turn]) -> Result<String, ProviderError> {
        let system_prompt = self.build_system_prompt(query);
        let messages = self.build_messages(query, history);

        let response = self
            .text_provider
            .generate(&system_prompt, &messages)
            .await?;

        tracing::debug!(
            provider = self.text_provider.name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Generated answer"
        );

        Ok(response.text)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.knowledge.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Knowledge base is empty".to_string(),
            ));
        }
        self.text_provider.health_check().await
    }

    fn provider(&self) -> &'static str {
        self.text_provider.name()
    }
}
