//! Synthesis backend — one prompt in, rewritten text out.

use async_trait::async_trait;
use lorewiki_core::error::ProviderError;
use lorewiki_core::message::Message;
use lorewiki_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;

use crate::prompts::UPDATE_SYSTEM_PROMPT;

/// Turns an update prompt into the new attribute text.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// A `Synthesizer` that sends a single tool-less request to a provider.
pub struct ProviderSynthesizer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ProviderSynthesizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[async_trait]
impl Synthesizer for ProviderSynthesizer {
    async fn synthesize(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(UPDATE_SYSTEM_PROMPT), Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: vec![],
        };

        let response = self.provider.complete(request).await?;
        let text = response.message.content.trim();
        if text.is_empty() {
            // An empty completion would wipe the attribute.
            return Err(ProviderError::ApiError {
                status_code: 200,
                message: format!("{} returned an empty completion", self.provider.name()),
            });
        }
        Ok(text.to_string())
    }
}
