//! Error taxonomy for client construction and client calls.

use thiserror::Error;

use tablechat_core::config::ProviderSettings;

/// Errors raised while turning a provider name into a client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No settings section exists under the requested name.
    #[error("unknown provider '{0}': no settings section with that name")]
    UnknownProvider(String),

    /// No constructor is registered under the requested name.
    #[error("LLM client '{0}' is not registered")]
    NotRegistered(String),

    /// The constructor itself failed.
    #[error("failed to construct {provider} client: {reason}")]
    Construction { provider: String, reason: String },
}

impl ProviderError {
    pub fn construction(provider: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ProviderError::Construction {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    /// A constructor was handed another provider's settings record.
    pub fn settings_mismatch(provider: &str, got: &ProviderSettings) -> Self {
        Self::construction(
            provider,
            format!("expected {provider} settings, got {} settings", got.kind()),
        )
    }
}

/// Errors raised by a constructed client when it is used.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A credential the backend requires was never configured.
    #[error("{provider} client is missing credentials: {missing} is not set")]
    MissingCredentials {
        provider: &'static str,
        missing: &'static str,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The backend answered, but not in a shape we understand.
    #[error("{provider} returned an invalid response: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("Bedrock request failed: {0}")]
    Bedrock(String),
}

impl ClientError {
    /// Whether sending the same request again may succeed.
    ///
    /// Network failures, rate limits and server errors are retryable;
    /// other client errors (auth, not found, validation) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http { .. } => true,
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
