//! Image stage.
//!
//! Unlike the text stages, a failed image generation is not an error: the
//! artist logs it and substitutes a placeholder image URL derived from the
//! prompt, so the slide still ships.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::adapters::{LlmClient, DEFAULT_IMAGE_SIZE};
use crate::prompts::ImageEnhancer;

use super::extract::preview;

/// Placeholder image template; `{text}` receives the sanitized prompt excerpt
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/1280x720?text={text}";

const PLACEHOLDER_TEXT_CHARS: usize = 50;

#[derive(Clone)]
pub struct Artist {
    llm: Arc<dyn LlmClient>,
    enhance: ImageEnhancer,
    image_size: String,
}

impl Artist {
    pub fn new(llm: Arc<dyn LlmClient>, enhance: ImageEnhancer) -> Self {
        Self {
            llm,
            enhance,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }

    pub fn with_image_size(mut self, size: impl Into<String>) -> Self {
        self.image_size = size.into();
        self
    }

    /// Generate an image for `prompt`, returning its location.
    ///
    /// Never fails; image model errors yield [`placeholder_image_url`].
    #[instrument(skip_all, fields(provider = %self.llm.provider()))]
    pub async fn generate_image(&self, prompt: &str) -> String {
        let enhanced = (self.enhance)(prompt);
        info!(prompt = %preview(&enhanced.prompt, 80), "Generating image");

        match self
            .llm
            .generate_image(
                &enhanced.prompt,
                &self.image_size,
                enhanced.negative_prompt.as_deref(),
            )
            .await
        {
            Ok(location) => {
                info!(%location, "Image generated");
                location
            }
            Err(e) => {
                warn!(error = %e, "Image generation failed, using placeholder");
                placeholder_image_url(prompt)
            }
        }
    }
}

/// Deterministic placeholder URL for a prompt.
///
/// Takes the first 50 characters, turns whitespace into `+`, and drops
/// anything that is not alphanumeric or one of `-_.,`.
pub fn placeholder_image_url(prompt: &str) -> String {
    let text: String = prompt
        .chars()
        .take(PLACEHOLDER_TEXT_CHARS)
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('+'),
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ',') => Some(c),
            _ => None,
        })
        .collect();

    PLACEHOLDER_IMAGE_URL.replace("{text}", &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_sanitizes_prompt() {
        assert_eq!(
            placeholder_image_url("Neon city at night, rain & fog"),
            "https://placehold.co/1280x720?text=Neon+city+at+night,+rain++fog"
        );
    }

    #[test]
    fn test_placeholder_truncates_to_fifty_chars() {
        let prompt = "a".repeat(80);
        let url = placeholder_image_url(&prompt);
        assert_eq!(url, format!("https://placehold.co/1280x720?text={}", "a".repeat(50)));
    }

    #[test]
    fn test_placeholder_is_deterministic() {
        assert_eq!(
            placeholder_image_url("abstract waves"),
            placeholder_image_url("abstract waves")
        );
        assert_eq!(placeholder_image_url(""), "https://placehold.co/1280x720?text=");
    }
}
