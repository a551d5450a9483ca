//! Shared HTTP transport for the JSON-over-HTTP clients (OpenAI, Anthropic,
//! Ollama).
//!
//! Wraps a connection-pooled `reqwest::Client` and retries transient
//! failures (network errors, 429, 5xx) with exponential backoff.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{ClientError, ProviderError};

/// Delay before the first retry; doubled for each further attempt.
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

pub(crate) struct HttpTransport {
    client: reqwest::Client,
    provider: &'static str,
    max_retries: u32,
    backoff: Duration,
}

impl HttpTransport {
    /// Build a transport with the given request timeout.
    ///
    /// Performs no network I/O.
    pub(crate) fn new(
        provider: &'static str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::construction(provider, e))?;

        Ok(Self {
            client,
            provider,
            max_retries,
            backoff: DEFAULT_BACKOFF,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// POST `body` as JSON to `url` and decode the JSON reply.
    pub(crate) async fn post_json<B, R>(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &B,
    ) -> Result<R, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let provider = self.provider;
        let mut attempt: u32 = 0;

        loop {
            let result = self
                .client
                .post(url)
                .headers(headers.clone())
                .json(body)
                .send()
                .await;

            let err = match result {
                Ok(resp) if resp.status().is_success() => {
                    debug!(provider, attempt, "LLM response received");
                    return resp.json::<R>().await.map_err(|e| {
                        error!(provider, error = %e, "Failed to parse LLM response");
                        ClientError::InvalidResponse {
                            provider,
                            reason: e.to_string(),
                        }
                    });
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let body = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    ClientError::Api {
                        provider,
                        status,
                        body,
                    }
                }
                Err(e) => ClientError::Http {
                    provider,
                    source: e,
                },
            };

            if attempt >= self.max_retries || !err.is_retryable() {
                error!(provider, attempt, error = %err, "LLM request failed");
                return Err(err);
            }

            let backoff = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
            attempt += 1;
            warn!(
                provider,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Retrying LLM request"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

/// Build a header map from `(name, value)` pairs.
///
/// Values are marked sensitive so they never show up in debug output.
pub(crate) fn build_headers(
    provider: &'static str,
    pairs: &[(&'static str, &str)],
) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();
    for &(name, value) in pairs {
        let mut header_value = HeaderValue::from_str(value).map_err(|e| {
            ProviderError::construction(provider, format!("invalid value for header {name}: {e}"))
        })?;
        header_value.set_sensitive(true);
        headers.insert(HeaderName::from_static(name), header_value);
    }
    Ok(headers)
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
