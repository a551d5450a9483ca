//! LLM client trait: the object every registered constructor returns.
//!
//! Each backend (OpenAI, Anthropic, Ollama, Bedrock) implements this trait.
//! Callers only ever hold an `Arc<dyn LlmClient>`.

use async_trait::async_trait;
use tablechat_core::config::LlmSettings;
use tablechat_core::types::{LlmResponse, Message};

use crate::error::ClientError;

/// Per-call overrides of the provider's configured sampling settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionOptions {
    /// Maximum tokens to generate for this call.
    pub max_tokens: Option<u32>,
    /// Sampling temperature for this call.
    pub temperature: Option<f64>,
}

impl CompletionOptions {
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }

    /// Effective `(max_tokens, temperature)` for a call: overrides first,
    /// then the provider's settings.
    pub fn resolve(&self, settings: &LlmSettings) -> (Option<u32>, f64) {
        (
            self.max_tokens.or(settings.max_tokens),
            self.temperature.unwrap_or(settings.temperature),
        )
    }
}

/// Trait that all LLM clients implement.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat conversation and return the model's reply.
    ///
    /// Errors from the backend are returned unchanged; retries for transient
    /// failures happen inside the client, bounded by the provider's
    /// `max_retries`.
    async fn chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<LlmResponse, ClientError>;

    /// Single-prompt text prediction.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ClientError> {
        let messages = [Message::user(prompt)];
        let response = self.chat(&messages, options).await?;
        Ok(response.content)
    }

    /// The model this client sends requests to.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

impl std::fmt::Debug for dyn LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("display_name", &self.display_name())
            .field("model", &self.model())
            .finish()
    }
}
