//! OpenAI chat completions client.
//!
//! Talks to `POST {base_url}/chat/completions` with bearer auth. Any
//! OpenAI-compatible endpoint works by pointing `base_url` at it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tablechat_core::config::{LlmSettings, OpenAiSettings, ProviderSettings};
use tablechat_core::types::{LlmResponse, Message, UsageInfo};

use crate::error::{ClientError, ProviderError};
use crate::http::{build_headers, join_url, HttpTransport};
use crate::traits::{CompletionOptions, LlmClient};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const DISPLAY_NAME: &str = "OpenAI";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ─────────────────────────────────────────────
// OpenAiClient
// ─────────────────────────────────────────────

pub struct OpenAiClient {
    transport: HttpTransport,
    api_base: String,
    headers: HeaderMap,
    has_api_key: bool,
    model: String,
    settings: LlmSettings,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiClient {
    /// Build a client from OpenAI settings. An empty API key is accepted
    /// here and rejected when the client is first used.
    pub fn new(settings: &OpenAiSettings) -> Result<Self, ProviderError> {
        let api_base = settings
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let headers = if settings.api_key.is_empty() {
            HeaderMap::new()
        } else {
            let bearer = format!("Bearer {}", settings.api_key);
            build_headers(DISPLAY_NAME, &[("authorization", bearer.as_str())])?
        };

        Ok(Self {
            transport: HttpTransport::new(DISPLAY_NAME, REQUEST_TIMEOUT, settings.max_retries)?,
            api_base,
            headers,
            has_api_key: !settings.api_key.is_empty(),
            model: settings.default_model.clone(),
            settings: settings.llm(),
        })
    }

    fn completions_url(&self) -> String {
        join_url(&self.api_base, "chat/completions")
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
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
        debug!(
            provider = DISPLAY_NAME,
            model = %self.model,
            messages = messages.len(),
            "Calling LLM"
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature,
        };

        let response: ChatCompletionResponse = self
            .transport
            .post_json(&self.completions_url(), &self.headers, &request)
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::InvalidResponse {
                provider: DISPLAY_NAME,
                reason: "no choices in response".to_string(),
            })?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason,
            usage: response.usage,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        DISPLAY_NAME
    }
}

/// Registered constructor for `"openai"`.
pub fn openai_client(settings: &ProviderSettings) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match settings {
        ProviderSettings::OpenAi(s) => {
            debug!(model = %s.default_model, "Creating OpenAI client");
            Ok(Arc::new(OpenAiClient::new(s)?))
        }
        other => Err(ProviderError::settings_mismatch("openai", other)),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tablechat_core::config::AnthropicSettings;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(api_key: &str, base_url: Option<&str>) -> OpenAiSettings {
        OpenAiSettings {
            api_key: api_key.to_string(),
            base_url: base_url.map(String::from),
            max_retries: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_api_base() {
        let client = OpenAiClient::new(&settings("key", None)).unwrap();
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_custom_base_trailing_slash() {
        let client = OpenAiClient::new(&settings("key", Some("http://proxy:8080/v1/"))).unwrap();
        assert_eq!(client.completions_url(), "http://proxy:8080/v1/chat/completions");
    }

    #[test]
    fn test_constructor_rejects_other_settings() {
        let err = openai_client(&ProviderSettings::Anthropic(AnthropicSettings::default()))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Construction { .. }));
    }

    #[test]
    fn test_constructor_uses_default_model() {
        let client = openai_client(&ProviderSettings::OpenAi(OpenAiSettings::default())).unwrap();
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.display_name(), "OpenAI");
    }

    #[tokio::test]
    async fn test_missing_key_fails_on_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings("", Some(&server.uri()))).unwrap();
        let err = client
            .chat(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingCredentials {
                missing: "api_key",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_chat_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test-123"))
            .and(body_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "You analyse spreadsheets."},
                    {"role": "user", "content": "How many rows?"}
                ],
                "temperature": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "message": { "role": "assistant", "content": "There are 120 rows." },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 20,
                    "completion_tokens": 6,
                    "total_tokens": 26
                }
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings("sk-test-123", Some(&server.uri()))).unwrap();
        let messages = vec![
            Message::system("You analyse spreadsheets."),
            Message::user("How many rows?"),
        ];

        let resp = client
            .chat(&messages, &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(resp.content, "There are 120 rows.");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.usage.unwrap().total_tokens, 26);
    }

    #[tokio::test]
    async fn test_complete_sends_max_tokens_override() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(wiremock::matchers::body_partial_json(serde_json::json!({
                "max_tokens": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "Yes" }, "finish_reason": "stop" }]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings("key", Some(&server.uri()))).unwrap();
        let answer = client
            .complete("Plot sales by month", &CompletionOptions::with_max_tokens(10))
            .await
            .unwrap();
        assert_eq!(answer, "Yes");
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings("key", Some(&server.uri()))).unwrap();
        let err = client
            .chat(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings("bad", Some(&server.uri()))).unwrap();
        let err = client
            .chat(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();

        match err {
            ClientError::Api { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("Incorrect API key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
