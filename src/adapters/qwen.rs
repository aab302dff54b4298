//! DashScope (qwen) adapter.
//!
//! Chat goes through the OpenAI-compatible completions endpoint; images use
//! the synchronous multimodal-generation endpoint, and the returned image
//! URL is downloaded into the local image store.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::config::ModelConfig;
use crate::core::limits::GenerationLimits;
use crate::domain::Provider;

use super::images::ImageStore;
use super::{ensure_success, read_json, request_error, LlmClient, LlmError};

pub const CHAT_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions";
pub const IMAGE_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/multimodal-generation/generation";

/// Qwen chat + image client
pub struct QwenClient {
    api_key: String,
    text_model: String,
    image_model: String,
    chat_url: String,
    image_url: String,
    chat_timeout: Duration,
    image_timeout: Duration,
    client: reqwest::Client,
    images: ImageStore,
}

impl QwenClient {
    pub fn new(
        api_key: String,
        models: &ModelConfig,
        limits: &GenerationLimits,
        images: ImageStore,
    ) -> Self {
        Self {
            api_key,
            text_model: models.qwen_text.clone(),
            image_model: models.qwen_image.clone(),
            chat_url: CHAT_URL.to_string(),
            image_url: IMAGE_URL.to_string(),
            chat_timeout: limits.chat_timeout(),
            image_timeout: limits.image_timeout(),
            client: reqwest::Client::new(),
            images,
        }
    }

    /// Point the client at different endpoints (proxies, test servers)
    pub fn with_endpoints(mut self, chat_url: impl Into<String>, image_url: impl Into<String>) -> Self {
        self.chat_url = chat_url.into();
        self.image_url = image_url.into();
        self
    }

    fn chat_payload(&self, system_prompt: &str, user_prompt: &str) -> Value {
        json!({
            "model": self.text_model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        })
    }

    fn image_payload(&self, prompt: &str, size: &str, negative_prompt: Option<&str>) -> Value {
        let mut payload = json!({
            "model": self.image_model,
            "input": {
                "messages": [
                    {"role": "user", "content": [{"text": prompt}]}
                ]
            },
            "parameters": {
                "size": size,
                "prompt_extend": false,
                "watermark": false,
            },
        });

        if let Some(negative) = negative_prompt.filter(|n| !n.is_empty()) {
            payload["parameters"]["negative_prompt"] = Value::String(negative.to_string());
        }

        payload
    }

    async fn post(&self, url: &str, payload: &Value, timeout: Duration) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| request_error(Provider::Qwen, timeout, e))?;

        let response = ensure_success(Provider::Qwen, response).await?;
        read_json(Provider::Qwen, response).await
    }
}

#[async_trait]
impl LlmClient for QwenClient {
    fn provider(&self) -> Provider {
        Provider::Qwen
    }

    #[instrument(skip_all, fields(model = %self.text_model))]
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let payload = self.chat_payload(system_prompt, user_prompt);
        let data = self.post(&self.chat_url, &payload, self.chat_timeout).await?;

        data.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::MalformedResponse {
                provider: Provider::Qwen,
                detail: "missing choices[0].message.content".to_string(),
            })
    }

    #[instrument(skip_all, fields(model = %self.image_model))]
    async fn generate_image(
        &self,
        prompt: &str,
        size: &str,
        negative_prompt: Option<&str>,
    ) -> Result<String, LlmError> {
        let payload = self.image_payload(prompt, size, negative_prompt);
        debug!("Requesting qwen image generation");
        let data = self.post(&self.image_url, &payload, self.image_timeout).await?;

        let image_url = data
            .pointer("/output/choices/0/message/content/0/image")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::MalformedResponse {
                provider: Provider::Qwen,
                detail: "missing output.choices[0].message.content[0].image".to_string(),
            })?;
        info!("Qwen image generated, downloading");

        let path = self.images.save_from_url(Provider::Qwen, image_url).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}
