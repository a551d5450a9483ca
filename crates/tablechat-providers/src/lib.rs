//! LLM client layer for tablechat.
//!
//! # Architecture
//!
//! - [`traits::LlmClient`]: trait that all clients implement
//! - [`registry::ProviderRegistry`]: name → constructor mapping, plus the
//!   static [`registry::PROVIDERS`] table of built-in providers
//! - [`factory::LlmFactory`]: resolves a provider name against settings and
//!   the registry and builds the client
//! - [`openai`], [`anthropic`], [`ollama`], [`bedrock`]: the built-in clients

pub mod anthropic;
pub mod bedrock;
pub mod error;
pub mod factory;
mod http;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod traits;

pub use error::{ClientError, ProviderError};
pub use factory::{create_client, LlmFactory};
pub use registry::{
    find_by_name, register_builtin_clients, ClientConstructor, ProviderRegistry, ProviderSpec,
    PROVIDERS,
};
pub use traits::{CompletionOptions, LlmClient};
