//! Provider registry: the name → constructor mapping the factory resolves
//! against.
//!
//! The built-in providers are described by the static [`PROVIDERS`] table;
//! [`register_builtin_clients`] copies it into a [`ProviderRegistry`] at
//! startup. Tests and embedders may register additional constructors.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use tablechat_core::config::ProviderSettings;

use crate::anthropic::anthropic_client;
use crate::bedrock::bedrock_client;
use crate::error::ProviderError;
use crate::ollama::ollama_client;
use crate::openai::openai_client;
use crate::traits::LlmClient;

/// A registered client constructor.
pub type ClientConstructor =
    Arc<dyn Fn(&ProviderSettings) -> Result<Arc<dyn LlmClient>, ProviderError> + Send + Sync>;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one built-in provider
// ─────────────────────────────────────────────

/// Static description of one built-in provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Registry and settings-section name (e.g. `"openai"`).
    pub name: &'static str,
    /// Human-readable name for logs and `status` output.
    pub display_name: &'static str,
    /// Environment variables the loader reads for this provider.
    pub env_keys: &'static [&'static str],
    pub constructor: fn(&ProviderSettings) -> Result<Arc<dyn LlmClient>, ProviderError>,
}

/// The built-in providers, in display order.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openai",
        display_name: "OpenAI",
        env_keys: &["OPENAI_API_KEY"],
        constructor: openai_client,
    },
    ProviderSpec {
        name: "anthropic",
        display_name: "Anthropic",
        env_keys: &["ANTHROPIC_API_KEY"],
        constructor: anthropic_client,
    },
    ProviderSpec {
        name: "ollama",
        display_name: "Ollama",
        env_keys: &["OLLAMA_API_KEY", "OLLAMA_BASE_URL"],
        constructor: ollama_client,
    },
    ProviderSpec {
        name: "bedrock",
        display_name: "AWS Bedrock",
        env_keys: &[
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_SESSION_TOKEN",
            "AWS_DEFAULT_REGION",
        ],
        constructor: bedrock_client,
    },
];

/// Find a built-in provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

// ─────────────────────────────────────────────
// ProviderRegistry
// ─────────────────────────────────────────────

/// Mapping from provider name to the constructor that builds its client.
///
/// Names are case-sensitive. Registering a name twice replaces the earlier
/// constructor.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ClientConstructor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every entry of [`PROVIDERS`].
    pub fn with_builtin_clients() -> Self {
        let mut registry = Self::new();
        register_builtin_clients(&mut registry);
        registry
    }

    /// Register `constructor` under `name`, replacing any earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&ProviderSettings) -> Result<Arc<dyn LlmClient>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let replaced = self
            .constructors
            .insert(name.clone(), Arc::new(constructor))
            .is_some();
        debug!(provider = %name, replaced, "Registered LLM client constructor");
    }

    /// The constructor most recently registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<ClientConstructor, ProviderError> {
        self.constructors
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NotRegistered(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Register the constructors of all built-in providers.
pub fn register_builtin_clients(registry: &mut ProviderRegistry) {
    for spec in PROVIDERS {
        registry.register(spec.name, spec.constructor);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
