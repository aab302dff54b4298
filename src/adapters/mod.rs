//! Adapter interfaces for text and image generation backends.
//!
//! Adapters give the pipeline a provider-neutral view of a model:
//! chat completion and image generation, each able to fail with a
//! transport or provider error.

pub mod gemini;
pub mod images;
pub mod qwen;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::config::{KeyStore, ResolvedConfig};
use crate::core::extract::preview;
use crate::domain::Provider;

pub use gemini::GeminiClient;
pub use images::ImageStore;
pub use qwen::QwenClient;

/// Default image size requested from image models
pub const DEFAULT_IMAGE_SIZE: &str = "1280*720";

/// Errors raised by generation backends
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No API key configured for {provider}")]
    MissingApiKey { provider: Provider },

    #[error("{provider} request failed: {message}")]
    Transport { provider: Provider, message: String },

    #[error("{provider} request timed out after {seconds}s")]
    Timeout { provider: Provider, seconds: u64 },

    #[error("{provider} API error ({status}): {body}")]
    Provider {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unexpected response: {detail}")]
    MalformedResponse { provider: Provider, detail: String },

    #[error("Failed to store generated image: {0}")]
    Storage(#[from] std::io::Error),
}

/// Text completion + image generation capability
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider serving this client
    fn provider(&self) -> Provider;

    /// Send a system/user prompt pair, returning the raw text response
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;

    /// Generate an image, returning its URL or local path
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        negative_prompt: Option<&str>,
    ) -> Result<String, LlmError>;

    /// Minimal round trip used to validate credentials
    async fn health_check(&self) -> Result<(), LlmError> {
        self.chat("Reply OK", "Say OK").await.map(|_| ())
    }
}

/// Build the client for a provider.
///
/// An explicit non-empty `api_key` wins over the stored key. The key is
/// captured at construction, so later key rotation does not affect a
/// client already handed to a run.
pub fn create_client(
    provider: Provider,
    api_key: Option<&str>,
    config: &ResolvedConfig,
    keys: &KeyStore,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    let key = api_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| keys.get(provider))
        .ok_or(LlmError::MissingApiKey { provider })?;

    let images = ImageStore::new(config.images_dir.clone());

    let client: Arc<dyn LlmClient> = match provider {
        Provider::Qwen => Arc::new(QwenClient::new(key, &config.models, &config.limits, images)),
        Provider::Gemini => {
            Arc::new(GeminiClient::new(key, &config.models, &config.limits, images))
        }
    };

    Ok(client)
}

/// Map a reqwest failure onto the adapter error taxonomy
pub(crate) fn request_error(provider: Provider, timeout: Duration, err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout {
            provider,
            seconds: timeout.as_secs(),
        }
    } else {
        LlmError::Transport {
            provider,
            message: err.to_string(),
        }
    }
}

/// Reject non-2xx responses, keeping the first 500 chars of the body
pub(crate) async fn ensure_success(
    provider: Provider,
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = preview(&body, 500).to_string();
    error!(%provider, status = status.as_u16(), %body, "Provider API error");

    Err(LlmError::Provider {
        provider,
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn read_json(provider: Provider, response: reqwest::Response) -> Result<Value, LlmError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| LlmError::MalformedResponse {
            provider,
            detail: format!("body is not JSON: {}", e),
        })
}
