//! Ollama chat client (`POST {base_url}/api/chat`, non-streaming).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tablechat_core::config::{LlmSettings, OllamaSettings, ProviderSettings};
use tablechat_core::types::{LlmResponse, Message, UsageInfo};

use crate::error::{ClientError, ProviderError};
use crate::http::{build_headers, join_url, HttpTransport};
use crate::traits::{CompletionOptions, LlmClient};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const DISPLAY_NAME: &str = "Ollama";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ModelOptions,
}

#[derive(Debug, Serialize)]
struct ModelOptions {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

// ─────────────────────────────────────────────
// OllamaClient
// ─────────────────────────────────────────────

pub struct OllamaClient {
    transport: HttpTransport,
    base_url: String,
    headers: HeaderMap,
    model: String,
    settings: LlmSettings,
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OllamaClient {
    pub fn new(settings: &OllamaSettings) -> Result<Self, ProviderError> {
        let base_url = if settings.base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            settings.base_url.clone()
        };

        let headers = if settings.api_key.is_empty() {
            HeaderMap::new()
        } else {
            let bearer = format!("Bearer {}", settings.api_key);
            build_headers(DISPLAY_NAME, &[("authorization", bearer.as_str())])?
        };

        let timeout = Duration::from_secs(settings.request_timeout_secs);

        Ok(Self {
            transport: HttpTransport::new(DISPLAY_NAME, timeout, settings.max_retries)?,
            base_url,
            headers,
            model: settings.default_model.clone(),
            settings: settings.llm(),
        })
    }

    fn chat_url(&self) -> String {
        join_url(&self.base_url, "api/chat")
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<LlmResponse, ClientError> {
        let (max_tokens, temperature) = options.resolve(&self.settings);
        debug!(
            provider = DISPLAY_NAME,
            model = %self.model,
            messages = messages.len(),
            "Calling LLM"
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: ModelOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response: ChatResponse = self
            .transport
            .post_json(&self.chat_url(), &self.headers, &request)
            .await?;

        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(UsageInfo::new(prompt, completion)),
            _ => None,
        };

        Ok(LlmResponse {
            content: response.message.content,
            finish_reason: response.done_reason,
            usage,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }
}

/// Registered constructor for `"ollama"`.
pub fn ollama_client(settings: &ProviderSettings) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match settings {
        ProviderSettings::Ollama(s) => {
            debug!(model = %s.default_model, base_url = %s.base_url, "Creating Ollama client");
            Ok(Arc::new(OllamaClient::new(s)?))
        }
        other => Err(ProviderError::settings_mismatch("ollama", other)),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
