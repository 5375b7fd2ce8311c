//! Mock provider implementation for tests and offline runs.

use super::{ChatMessage, ChatRole, FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::time::Duration;

/// Mock text provider answering `Mock response for: <last user message>`.
pub struct MockTextProvider {
    enabled: bool,
    delay: Duration,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            delay: Duration::ZERO,
        }
    }

    /// Simulate provider latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let input_chars: usize =
            system_prompt.len() + messages.iter().map(|m| m.content.len()).sum::<usize>();

        Ok(ProviderResponse {
            text: format!("Mock response for: {}", prompt),
            input_tokens: (input_chars / 4) as u32,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
