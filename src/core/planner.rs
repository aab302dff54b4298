//! Outline stage: topic in, validated deck outline out.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::adapters::LlmClient;
use crate::domain::Outline;
use crate::prompts::PromptSet;

use super::extract::{parse_stage_json, preview, StageError};
use super::limits::GenerationLimits;

const STAGE: &str = "outline";

/// Produces the deck outline for a topic
#[derive(Clone)]
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    prompts: PromptSet,
    limits: GenerationLimits,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptSet, limits: GenerationLimits) -> Self {
        Self {
            llm,
            prompts,
            limits,
        }
    }

    /// Ask the text model for an outline, then parse and validate it
    #[instrument(skip(self), fields(provider = %self.llm.provider()))]
    pub async fn generate_outline(&self, topic: &str) -> Result<Outline, StageError> {
        info!("Generating outline");

        let user_prompt = self.prompts.planner_user(topic);
        let raw = self.llm.chat(self.prompts.planner_system, &user_prompt).await?;
        debug!(chars = raw.len(), head = %preview(&raw, 300), "Planner raw response");

        let outline: Outline = parse_stage_json(STAGE, &raw)?;
        self.limits
            .check_outline(&outline)
            .map_err(|violation| StageError::Validation {
                stage: STAGE,
                violation,
            })?;

        info!(slides = outline.slides.len(), title = %outline.title, "Outline ready");
        Ok(outline)
    }
}
