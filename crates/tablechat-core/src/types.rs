//! Chat types shared by every LLM client.
//!
//! Messages serialize in the `{"role": ..., "content": ...}` shape that the
//! OpenAI and Ollama chat endpoints accept directly. Clients with other wire
//! formats (Anthropic, Bedrock) convert from these.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// A single text chat message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },

    #[serde(rename = "assistant")]
    Assistant { content: String },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
        }
    }

    /// The wire name of this message's role.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
        }
    }

    /// The text content of this message.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content } => content,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Message::System { .. })
    }
}

// ─────────────────────────────────────────────
// LLM Response
// ─────────────────────────────────────────────

/// Normalized response from any LLM client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResponse {
    /// Text produced by the model (empty if it produced none).
    pub content: String,
    /// Why the model stopped generating, in the backend's own vocabulary.
    pub finish_reason: Option<String>,
    /// Token usage statistics, when the backend reports them.
    pub usage: Option<UsageInfo>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        LlmResponse {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Token usage statistics from the LLM.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl UsageInfo {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        UsageInfo {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
