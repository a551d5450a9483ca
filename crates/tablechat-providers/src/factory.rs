//! Client factory: provider name + settings + registry → ready client.

use std::sync::Arc;

use tracing::{debug, info};

use tablechat_core::config::{ProviderSettings, SettingsSource};

use crate::error::ProviderError;
use crate::registry::ProviderRegistry;
use crate::traits::LlmClient;

/// A constructed client together with the name and settings it was built
/// from.
///
/// A factory value only exists once construction has succeeded.
#[derive(Clone)]
pub struct LlmFactory {
    pub provider: String,
    pub settings: ProviderSettings,
    pub client: Arc<dyn LlmClient>,
}

impl LlmFactory {
    /// Build the client registered under `provider`.
    ///
    /// Errors, in the order they are checked:
    /// - [`ProviderError::UnknownProvider`] if `settings` has no section named `provider`
    /// - [`ProviderError::NotRegistered`] if `registry` has no constructor for it
    /// - whatever the constructor returns, unchanged
    pub fn new<S>(
        provider: &str,
        settings: &S,
        registry: &ProviderRegistry,
    ) -> Result<Self, ProviderError>
    where
        S: SettingsSource + ?Sized,
    {
        let provider_settings = settings
            .provider_settings(provider)
            .ok_or_else(|| ProviderError::UnknownProvider(provider.to_string()))?;

        let constructor = registry.resolve(provider)?;

        debug!(provider, model = provider_settings.default_model(), "Constructing LLM client");
        let client = constructor(&provider_settings)?;
        info!(provider, model = client.model(), "LLM client ready");

        Ok(Self {
            provider: provider.to_string(),
            settings: provider_settings,
            client,
        })
    }
}

impl std::fmt::Debug for LlmFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmFactory")
            .field("provider", &self.provider)
            .field("model", &self.client.model())
            .finish()
    }
}

/// Function form of [`LlmFactory::new`] returning only the client.
pub fn create_client<S>(
    provider: &str,
    settings: &S,
    registry: &ProviderRegistry,
) -> Result<Arc<dyn LlmClient>, ProviderError>
where
    S: SettingsSource + ?Sized,
{
    LlmFactory::new(provider, settings, registry).map(|factory| factory.client)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
