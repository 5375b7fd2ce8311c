//! Text generation provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction for chat-style LLM
//! backends, allowing swapping between OpenAI-compatible APIs, Gemini and a
//! deterministic mock.

pub mod gemini;
pub mod mock;
pub mod openai;

use crate::config::{LlmConfig, LlmProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Whether the failure means the backend cannot be reached or used right
    /// now, as opposed to a failure while producing an answer.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ProviderError::NotConfigured(_)
                | ProviderError::NetworkError(_)
                | ProviderError::RateLimited
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::EmptyResponse => "empty_response",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: FinishReason,
}

/// Trait for chat completion providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate the next assistant message.
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Provider label used in logs and metrics.
    fn name(&self) -> &'static str;
}

/// Build the provider selected by configuration.
pub fn build_text_provider(config: &LlmConfig) -> Result<Arc<dyn TextProvider>, ProviderError> {
    let provider: Arc<dyn TextProvider> = match config.provider {
        LlmProvider::OpenAi => {
            let api_key = config.api_key().ok_or_else(|| {
                ProviderError::NotConfigured("OpenAI API key not configured".to_string())
            })?;
            Arc::new(openai::OpenAiTextProvider::new(openai::OpenAiConfig {
                api_key: api_key.to_string(),
                model: config.model.clone(),
                base_url: config.base_url.clone(),
                timeout: config.timeout,
            })?)
        }
        LlmProvider::Gemini => {
            let api_key = config.api_key().ok_or_else(|| {
                ProviderError::NotConfigured("Gemini API key not configured".to_string())
            })?;
            Arc::new(gemini::GeminiTextProvider::new(gemini::GeminiConfig {
                api_key: api_key.to_string(),
                model: config.model.clone(),
                base_url: gemini::GEMINI_API_BASE.to_string(),
                timeout: config.timeout,
            })?)
        }
        LlmProvider::Mock => Arc::new(mock::MockTextProvider::new(true)),
    };

    tracing::info!(
        provider = provider.name(),
        model = %config.model,
        "Initialized text provider"
    );

    Ok(provider)
}
