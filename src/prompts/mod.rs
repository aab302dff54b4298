//! Provider-specific prompt bundles.
//!
//! Each provider maps to a [`PromptSet`]: planner prompts, a designer
//! system prompt with a user-prompt builder, and an image-prompt enhancer.
//! Stages receive a `PromptSet` rather than branching on the provider.

pub mod gemini;
pub mod qwen;

use std::collections::HashMap;

use crate::domain::{DeckMetadata, Provider, SlideBrief};

/// Builds the designer user prompt for one slide
pub type DesignerPromptBuilder = fn(&DeckMetadata, &SlideBrief, usize) -> String;

/// Rewrites a raw image prompt for a specific image model
pub type ImageEnhancer = fn(&str) -> EnhancedPrompt;

/// Marker replaced by the topic in planner user templates
pub const TOPIC_MARKER: &str = "{topic}";

/// Image prompt after provider-specific enhancement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedPrompt {
    pub prompt: String,

    /// Only set for models that accept a native negative prompt
    pub negative_prompt: Option<String>,
}

impl EnhancedPrompt {
    pub fn plain(prompt: String) -> Self {
        Self {
            prompt,
            negative_prompt: None,
        }
    }
}

/// The prompt capabilities a provider contributes to the pipeline
#[derive(Clone, Copy)]
pub struct PromptSet {
    pub planner_system: &'static str,

    /// Planner user prompt containing [`TOPIC_MARKER`]
    pub planner_user_template: &'static str,

    pub designer_system: &'static str,
    pub designer_user: DesignerPromptBuilder,
    pub enhance_image: ImageEnhancer,
}

impl std::fmt::Debug for PromptSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptSet")
            .field("planner_system_len", &self.planner_system.len())
            .field("designer_system_len", &self.designer_system.len())
            .finish_non_exhaustive()
    }
}

impl PromptSet {
    pub fn planner_user(&self, topic: &str) -> String {
        self.planner_user_template.replace(TOPIC_MARKER, topic)
    }

    pub fn designer_user(&self, metadata: &DeckMetadata, brief: &SlideBrief, index: usize) -> String {
        (self.designer_user)(metadata, brief, index)
    }

    pub fn enhance_image(&self, prompt: &str) -> EnhancedPrompt {
        (self.enhance_image)(prompt)
    }
}

/// Lookup table from provider tag to prompt bundle
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    sets: HashMap<Provider, PromptSet>,
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptRegistry {
    /// Registry holding the bundled prompts for every provider
    pub fn builtin() -> Self {
        let mut sets = HashMap::new();
        sets.insert(Provider::Qwen, qwen::prompt_set());
        sets.insert(Provider::Gemini, gemini::prompt_set());
        Self { sets }
    }

    /// Replace the bundle used for a provider
    pub fn register(&mut self, provider: Provider, set: PromptSet) {
        self.sets.insert(provider, set);
    }

    pub fn get(&self, provider: Provider) -> Option<&PromptSet> {
        self.sets.get(&provider)
    }

    /// Bundle for a provider, falling back to the Gemini prompts
    pub fn resolve(&self, provider: Provider) -> PromptSet {
        self.get(provider)
            .or_else(|| self.get(Provider::Gemini))
            .copied()
            .unwrap_or_else(gemini::prompt_set)
    }
}

/// Shared designer user prompt body; providers wrap it with their own framing
pub(crate) fn slide_brief_block(metadata: &DeckMetadata, brief: &SlideBrief) -> String {
    format!(
        "- Topic: \"{topic}\"\n\
         - Visual Theme: \"{theme}\"\n\
         - Tone: \"{tone}\"\n\
         - Accent Color: {accent}\n\n\
         Slide brief:\n\
         - Title: \"{title}\"\n\
         - Purpose: \"{purpose}\"\n\
         - Visual Direction: \"{advice}\"",
        topic = metadata.topic,
        theme = metadata.visual_theme,
        tone = metadata.tone,
        accent = metadata.accent_color,
        title = brief.title,
        purpose = brief.purpose,
        advice = brief.visual_advice,
    )
}
