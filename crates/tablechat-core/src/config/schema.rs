//! Settings schema: one record per LLM provider plus the root `AppSettings`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! Every field has a default, so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};

/// Names of the provider sections in [`AppSettings`], in display order.
pub const PROVIDER_NAMES: [&str; 4] = ["openai", "anthropic", "ollama", "bedrock"];

fn default_max_retries() -> u32 {
    3
}

// ─────────────────────────────────────────────
// Root settings
// ─────────────────────────────────────────────

/// Root settings: loaded from `~/.tablechat/config.json` + env vars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Provider used when the CLI is not told otherwise.
    pub default_provider: String,
    pub openai: OpenAiSettings,
    pub anthropic: AnthropicSettings,
    pub ollama: OllamaSettings,
    pub bedrock: BedrockSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_provider: "bedrock".to_string(),
            openai: OpenAiSettings::default(),
            anthropic: AnthropicSettings::default(),
            ollama: OllamaSettings::default(),
            bedrock: BedrockSettings::default(),
        }
    }
}

/// Lookup of per-provider settings by section name.
///
/// The client factory depends on this trait rather than on [`AppSettings`]
/// directly, so callers can supply their own settings.
pub trait SettingsSource {
    /// Settings for the section named exactly `name`, if one exists.
    fn provider_settings(&self, name: &str) -> Option<ProviderSettings>;
}

impl SettingsSource for AppSettings {
    fn provider_settings(&self, name: &str) -> Option<ProviderSettings> {
        match name {
            "openai" => Some(ProviderSettings::OpenAi(self.openai.clone())),
            "anthropic" => Some(ProviderSettings::Anthropic(self.anthropic.clone())),
            "ollama" => Some(ProviderSettings::Ollama(self.ollama.clone())),
            "bedrock" => Some(ProviderSettings::Bedrock(self.bedrock.clone())),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Common LLM settings
// ─────────────────────────────────────────────

/// Sampling and retry settings shared by every provider.
#[derive(Clone, Debug, PartialEq)]
pub struct LlmSettings {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Extra attempts after the first failed request.
    pub max_retries: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            max_retries: default_max_retries(),
        }
    }
}

// ─────────────────────────────────────────────
// Provider records
// ─────────────────────────────────────────────

/// OpenAI settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiSettings {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    /// Falls back to `OPENAI_API_KEY`.
    pub api_key: String,
    pub default_model: String,
    /// Custom API base URL (defaults to `https://api.openai.com/v1`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            max_retries: default_max_retries(),
            api_key: String::new(),
            default_model: "gpt-4o".to_string(),
            base_url: None,
        }
    }
}

/// Anthropic settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnthropicSettings {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    /// Falls back to `ANTHROPIC_API_KEY`.
    pub api_key: String,
    pub default_model: String,
    /// Custom API base URL (defaults to `https://api.anthropic.com`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            max_retries: default_max_retries(),
            api_key: String::new(),
            default_model: "claude-3-7-sonnet-20250219".to_string(),
            base_url: None,
        }
    }
}

/// Ollama settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OllamaSettings {
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    /// Optional; only sent when non-empty (hosted Ollama behind a proxy).
    pub api_key: String,
    /// Falls back to `OLLAMA_BASE_URL`, then `http://localhost:11434`.
    pub base_url: String,
    pub default_model: String,
    pub request_timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            max_retries: default_max_retries(),
            api_key: String::new(),
            base_url: String::new(),
            default_model: "codellama:13b".to_string(),
            request_timeout_secs: 240,
        }
    }
}

/// AWS Bedrock settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BedrockSettings {
    pub temperature: f64,
    /// Written as `null` when unset, since the default is `Some(1024)`.
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    /// Falls back to `AWS_ACCESS_KEY_ID`.
    pub access_key_id: String,
    /// Falls back to `AWS_SECRET_ACCESS_KEY`.
    pub secret_access_key: String,
    /// Falls back to `AWS_SESSION_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Falls back to `AWS_DEFAULT_REGION`.
    pub default_region: String,
    pub default_model: String,
    pub context_window: u32,
    pub request_timeout_secs: u64,
}

impl Default for BedrockSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: Some(1024),
            max_retries: default_max_retries(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            default_region: String::new(),
            default_model: "anthropic.claude-3-5-sonnet-20241022-v2:0".to_string(),
            context_window: 8192,
            request_timeout_secs: 120,
        }
    }
}

macro_rules! impl_llm_settings {
    ($($record:ty),+) => {
        $(
            impl $record {
                /// The sampling and retry part of this record.
                pub fn llm(&self) -> LlmSettings {
                    LlmSettings {
                        temperature: self.temperature,
                        max_tokens: self.max_tokens,
                        max_retries: self.max_retries,
                    }
                }
            }
        )+
    };
}

impl_llm_settings!(OpenAiSettings, AnthropicSettings, OllamaSettings, BedrockSettings);

// ─────────────────────────────────────────────
// ProviderSettings: what a client constructor receives
// ─────────────────────────────────────────────

/// Settings for one provider, as handed to a client constructor.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderSettings {
    OpenAi(OpenAiSettings),
    Anthropic(AnthropicSettings),
    Ollama(OllamaSettings),
    Bedrock(BedrockSettings),
}

impl ProviderSettings {
    /// Section name of the record this value came from.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderSettings::OpenAi(_) => "openai",
            ProviderSettings::Anthropic(_) => "anthropic",
            ProviderSettings::Ollama(_) => "ollama",
            ProviderSettings::Bedrock(_) => "bedrock",
        }
    }

    /// The sampling and retry settings common to all providers.
    pub fn llm(&self) -> LlmSettings {
        match self {
            ProviderSettings::OpenAi(s) => s.llm(),
            ProviderSettings::Anthropic(s) => s.llm(),
            ProviderSettings::Ollama(s) => s.llm(),
            ProviderSettings::Bedrock(s) => s.llm(),
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            ProviderSettings::OpenAi(s) => &s.default_model,
            ProviderSettings::Anthropic(s) => &s.default_model,
            ProviderSettings::Ollama(s) => &s.default_model,
            ProviderSettings::Bedrock(s) => &s.default_model,
        }
    }

    /// Whether the credentials this provider needs are present.
    ///
    /// Ollama needs none.
    pub fn has_credentials(&self) -> bool {
        match self {
            ProviderSettings::OpenAi(s) => !s.api_key.is_empty(),
            ProviderSettings::Anthropic(s) => !s.api_key.is_empty(),
            ProviderSettings::Ollama(_) => true,
            ProviderSettings::Bedrock(s) => {
                !s.access_key_id.is_empty()
                    && !s.secret_access_key.is_empty()
                    && !s.default_region.is_empty()
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
