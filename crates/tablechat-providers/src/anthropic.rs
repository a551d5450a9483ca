//! Anthropic Messages API client.
//!
//! System messages are lifted out of the conversation into the top-level
//! `system` field, since the Messages API only accepts user/assistant turns.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tablechat_core::config::{AnthropicSettings, LlmSettings, ProviderSettings};
use tablechat_core::types::{LlmResponse, Message, UsageInfo};

use crate::error::{ClientError, ProviderError};
use crate::http::{build_headers, join_url, HttpTransport};
use crate::traits::{CompletionOptions, LlmClient};

pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

/// The Messages API requires `max_tokens`; used when settings leave it unset.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const DISPLAY_NAME: &str = "Anthropic";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<TurnMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct TurnMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Split a conversation into the `system` prompt and the user/assistant turns.
fn split_system(messages: &[Message]) -> (Option<String>, Vec<TurnMessage<'_>>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.is_system())
        .map(Message::content)
        .collect();

    let turns = messages
        .iter()
        .filter(|m| !m.is_system())
        .map(|m| TurnMessage {
            role: m.role(),
            content: m.content(),
        })
        .collect();

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };
    (system, turns)
}

// ─────────────────────────────────────────────
// AnthropicClient
// ─────────────────────────────────────────────

pub struct AnthropicClient {
    transport: HttpTransport,
    api_base: String,
    headers: HeaderMap,
    has_api_key: bool,
    model: String,
    settings: LlmSettings,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicClient {
    pub fn new(settings: &AnthropicSettings) -> Result<Self, ProviderError> {
        let api_base = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let mut pairs = vec![("anthropic-version", API_VERSION)];
        if !settings.api_key.is_empty() {
            pairs.push(("x-api-key", settings.api_key.as_str()));
        }
        let headers = build_headers(DISPLAY_NAME, &pairs)?;

        Ok(Self {
            transport: HttpTransport::new(DISPLAY_NAME, REQUEST_TIMEOUT, settings.max_retries)?,
            api_base,
            headers,
            has_api_key: !settings.api_key.is_empty(),
            model: settings.default_model.clone(),
            settings: settings.llm(),
        })
    }

    fn messages_url(&self) -> String {
        join_url(&self.api_base, "v1/messages")
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<LlmResponse, ClientError> {
        if !self.has_api_key {
            return Err(ClientError::MissingCredentials {
                provider: DISPLAY_NAME,
                missing: "api_key",
            });
        }

        let (max_tokens, temperature) = options.resolve(&self.settings);
        let (system, turns) = split_system(messages);
        debug!(
            provider = DISPLAY_NAME,
            model = %self.model,
            messages = turns.len(),
            has_system = system.is_some(),
            "Calling LLM"
        );

        let request = MessagesRequest {
            model: &self.model,
            system,
            messages: turns,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature,
        };

        let response: MessagesResponse = self
            .transport
            .post_json(&self.messages_url(), &self.headers, &request)
            .await?;

        let content = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse {
            content,
            finish_reason: response.stop_reason,
            usage: response
                .usage
                .map(|u| UsageInfo::new(u.input_tokens, u.output_tokens)),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }
}

/// Registered constructor for `"anthropic"`.
pub fn anthropic_client(
    settings: &ProviderSettings,
) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match settings {
        ProviderSettings::Anthropic(s) => {
            debug!(model = %s.default_model, "Creating Anthropic client");
            Ok(Arc::new(AnthropicClient::new(s)?))
        }
        other => Err(ProviderError::settings_mismatch("anthropic", other)),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
