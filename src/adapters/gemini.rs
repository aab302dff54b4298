//! Google Gemini adapter.
//!
//! Text uses `generateContent` with a JSON response mime type and a
//! thinking budget; thought parts are skipped when reading the answer.
//! Image generation returns inline base64 data saved to the image store.
//! The image API has no negative-prompt parameter, so it is ignored.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::config::ModelConfig;
use crate::core::limits::GenerationLimits;
use crate::domain::Provider;

use super::images::ImageStore;
use super::{ensure_success, read_json, request_error, LlmClient, LlmError};

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const THINKING_BUDGET: u32 = 8192;

/// Gemini chat + image client
pub struct GeminiClient {
    api_key: String,
    text_model: String,
    image_model: String,
    base_url: String,
    chat_timeout: Duration,
    image_timeout: Duration,
    client: reqwest::Client,
    images: ImageStore,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        models: &ModelConfig,
        limits: &GenerationLimits,
        images: ImageStore,
    ) -> Self {
        Self {
            api_key,
            text_model: models.gemini_text.clone(),
            image_model: models.gemini_image.clone(),
            base_url: BASE_URL.to_string(),
            chat_timeout: limits.chat_timeout(),
            image_timeout: limits.image_timeout(),
            client: reqwest::Client::new(),
            images,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the generateContent URL for a model
    fn model_url(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    async fn post(&self, model: &str, payload: &Value, timeout: Duration) -> Result<Vec<Value>, LlmError> {
        let response = self
            .client
            .post(self.model_url(model))
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| request_error(Provider::Gemini, timeout, e))?;

        let response = ensure_success(Provider::Gemini, response).await?;
        let data = read_json(Provider::Gemini, response).await?;

        data.pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| LlmError::MalformedResponse {
                provider: Provider::Gemini,
                detail: "missing candidates[0].content.parts".to_string(),
            })
    }
}

/// First non-thought text part, else the last text part
fn answer_text(parts: &[Value]) -> Option<&str> {
    let is_thought = |part: &Value| part.get("thought").and_then(Value::as_bool).unwrap_or(false);

    parts
        .iter()
        .filter(|part| !is_thought(*part))
        .find_map(|part| part.get("text").and_then(Value::as_str))
        .or_else(|| {
            parts
                .iter()
                .rev()
                .find_map(|part| part.get("text").and_then(Value::as_str))
        })
}

fn thinking_chars(parts: &[Value]) -> usize {
    parts
        .iter()
        .filter(|part| part.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .map(str::len)
        .sum()
}

fn inline_image_data(parts: &[Value]) -> Option<&str> {
    parts
        .iter()
        .find_map(|part| part.pointer("/inlineData/data").and_then(Value::as_str))
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    #[instrument(skip_all, fields(model = %self.text_model))]
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "system_instruction": {"parts": [{"text": system_prompt}]},
            "contents": [{"parts": [{"text": user_prompt}]}],
            "generationConfig": {
                "responseMimeType": "application/json",
                "thinkingConfig": {"thinkingBudget": THINKING_BUDGET},
            },
        });

        let parts = self.post(&self.text_model, &payload, self.chat_timeout).await?;

        let thinking = thinking_chars(&parts);
        if thinking > 0 {
            debug!(thinking_chars = thinking, "Gemini returned thinking parts");
        }

        answer_text(&parts)
            .map(str::to_string)
            .ok_or_else(|| LlmError::MalformedResponse {
                provider: Provider::Gemini,
                detail: "no text content returned".to_string(),
            })
    }

    #[instrument(skip_all, fields(model = %self.image_model))]
    async fn generate_image(
        &self,
        prompt: &str,
        _size: &str,
        negative_prompt: Option<&str>,
    ) -> Result<String, LlmError> {
        if negative_prompt.is_some() {
            warn!("Gemini image API has no negative prompt; ignoring it");
        }

        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": {"aspectRatio": "16:9", "imageSize": "2K"},
            },
        });

        let parts = self.post(&self.image_model, &payload, self.image_timeout).await?;

        let data = inline_image_data(&parts).ok_or_else(|| LlmError::MalformedResponse {
            provider: Provider::Gemini,
            detail: "no image data returned".to_string(),
        })?;

        let path = self.images.save_base64(Provider::Gemini, data).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}
