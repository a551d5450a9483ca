//! AWS Bedrock client over the Converse API.
//!
//! Credentials and region come straight from [`BedrockSettings`]; the
//! ambient AWS credential chain is not consulted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_bedrockruntime::config::retry::RetryConfig;
use aws_sdk_bedrockruntime::config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, ConverseOutput, InferenceConfiguration,
    Message as BedrockMessage, SystemContentBlock,
};
use tracing::debug;

use tablechat_core::config::{BedrockSettings, LlmSettings, ProviderSettings};
use tablechat_core::types::{LlmResponse, Message, UsageInfo};

use crate::error::{ClientError, ProviderError};
use crate::traits::{CompletionOptions, LlmClient};

const DISPLAY_NAME: &str = "Bedrock";
const CREDENTIALS_PROVIDER: &str = "tablechat-settings";

pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
    model: String,
    region: String,
    /// First required field that was left empty, if any.
    missing: Option<&'static str>,
    settings: LlmSettings,
}

impl std::fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockClient")
            .field("model", &self.model)
            .field("region", &self.region)
            .finish()
    }
}

impl BedrockClient {
    /// Build a Bedrock runtime client. No credentials are validated and no
    /// network I/O happens until the first call.
    pub fn new(settings: &BedrockSettings) -> Result<Self, ProviderError> {
        let missing = if settings.access_key_id.is_empty() {
            Some("access_key_id")
        } else if settings.secret_access_key.is_empty() {
            Some("secret_access_key")
        } else if settings.default_region.is_empty() {
            Some("default_region")
        } else {
            None
        };

        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            settings.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        );

        let config = aws_sdk_bedrockruntime::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.default_region.clone()))
            .credentials_provider(credentials)
            .retry_config(
                RetryConfig::standard().with_max_attempts(settings.max_retries.saturating_add(1)),
            )
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(settings.request_timeout_secs))
                    .build(),
            )
            .build();

        Ok(Self {
            client: aws_sdk_bedrockruntime::Client::from_conf(config),
            model: settings.default_model.clone(),
            region: settings.default_region.clone(),
            missing,
            settings: settings.llm(),
        })
    }
}

/// Split a conversation into Converse system blocks and turns.
fn to_converse(
    messages: &[Message],
) -> Result<(Vec<SystemContentBlock>, Vec<BedrockMessage>), ClientError> {
    let mut system = Vec::new();
    let mut turns = Vec::new();

    for message in messages {
        let role = match message {
            Message::System { content } => {
                system.push(SystemContentBlock::Text(content.clone()));
                continue;
            }
            Message::User { .. } => ConversationRole::User,
            Message::Assistant { .. } => ConversationRole::Assistant,
        };

        let turn = BedrockMessage::builder()
            .role(role)
            .content(ContentBlock::Text(message.content().to_string()))
            .build()
            .map_err(|e| ClientError::Bedrock(e.to_string()))?;
        turns.push(turn);
    }

    Ok((system, turns))
}

#[async_trait]
impl LlmClient for BedrockClient {
    async fn chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<LlmResponse, ClientError> {
        if let Some(missing) = self.missing {
            return Err(ClientError::MissingCredentials {
                provider: DISPLAY_NAME,
                missing,
            });
        }

        let (max_tokens, temperature) = options.resolve(&self.settings);
        let (system, turns) = to_converse(messages)?;
        debug!(
            provider = DISPLAY_NAME,
            model = %self.model,
            region = %self.region,
            messages = turns.len(),
            "Calling LLM"
        );

        let inference = InferenceConfiguration::builder()
            .set_max_tokens(max_tokens.map(|t| t.min(i32::MAX as u32) as i32))
            .temperature(temperature as f32)
            .build();

        let output = self
            .client
            .converse()
            .model_id(&self.model)
            .set_system(if system.is_empty() { None } else { Some(system) })
            .set_messages(Some(turns))
            .inference_config(inference)
            .send()
            .await
            .map_err(|e| ClientError::Bedrock(DisplayErrorContext(&e).to_string()))?;

        let content = match output.output() {
            Some(ConverseOutput::Message(message)) => message
                .content()
                .iter()
                .filter_map(|block| block.as_text().ok())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(""),
            _ => {
                return Err(ClientError::InvalidResponse {
                    provider: DISPLAY_NAME,
                    reason: "converse output contained no message".to_string(),
                })
            }
        };

        let usage = output.usage().map(|u| {
            UsageInfo::new(
                u.input_tokens().max(0) as u32,
                u.output_tokens().max(0) as u32,
            )
        });

        Ok(LlmResponse {
            content,
            finish_reason: Some(output.stop_reason().as_str().to_string()),
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

/// Registered constructor for `"bedrock"`.
pub fn bedrock_client(settings: &ProviderSettings) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match settings {
        ProviderSettings::Bedrock(s) => {
            debug!(
                model = %s.default_model,
                region = %s.default_region,
                "Creating Bedrock client"
            );
            Ok(Arc::new(BedrockClient::new(s)?))
        }
        other => Err(ProviderError::settings_mismatch("bedrock", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_settings() -> BedrockSettings {
        BedrockSettings {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
            default_region: "us-east-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_converse_lifts_system_blocks() {
        let (system, turns) = to_converse(&[
            Message::system("You analyse spreadsheets."),
            Message::user("Sum of sales?"),
            Message::assistant("12,400"),
        ])
        .unwrap();

        assert_eq!(system.len(), 1);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role(), &ConversationRole::User);
        assert_eq!(turns[1].role(), &ConversationRole::Assistant);
        assert_eq!(turns[0].content()[0].as_text().unwrap(), "Sum of sales?");
    }

    #[tokio::test]
    async fn test_construction_uses_settings() {
        let client = bedrock_client(&ProviderSettings::Bedrock(full_settings())).unwrap();
        assert_eq!(client.model(), "anthropic.claude-3-5-sonnet-20241022-v2:0");
        assert_eq!(client.display_name(), "Bedrock");
    }

    #[tokio::test]
    async fn test_missing_region_fails_on_use() {
        let client = BedrockClient::new(&BedrockSettings {
            default_region: String::new(),
            ..full_settings()
        })
        .unwrap();

        let err = client
            .complete("hi", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingCredentials {
                missing: "default_region",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_access_key_reported_first() {
        let client = BedrockClient::new(&BedrockSettings::default()).unwrap();
        let err = client
            .chat(&[Message::user("hi")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingCredentials {
                missing: "access_key_id",
                ..
            }
        ));
    }

    #[test]
    fn test_constructor_rejects_other_settings() {
        let err = bedrock_client(&ProviderSettings::Ollama(Default::default())).unwrap_err();
        assert!(matches!(err, ProviderError::Construction { .. }));
    }
}
