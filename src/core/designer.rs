//! Slide design stage: one outline brief in, structured slide design out.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::adapters::LlmClient;
use crate::domain::{DeckMetadata, SlideBrief, SlideDesign};
use crate::prompts::PromptSet;

use super::extract::{parse_stage_json, preview, StageError};

const STAGE: &str = "slide design";

#[derive(Clone)]
pub struct Designer {
    llm: Arc<dyn LlmClient>,
    prompts: PromptSet,
}

impl Designer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptSet) -> Self {
        Self { llm, prompts }
    }

    #[instrument(skip(self, metadata, brief), fields(slide_index = index, title = %brief.title))]
    pub async fn design_slide(
        &self,
        metadata: &DeckMetadata,
        brief: &SlideBrief,
        index: usize,
    ) -> Result<SlideDesign, StageError> {
        let user_prompt = self.prompts.designer_user(metadata, brief, index);
        let raw = self.llm.chat(self.prompts.designer_system, &user_prompt).await?;
        debug!(chars = raw.len(), head = %preview(&raw, 300), "Designer raw response");

        let design: SlideDesign = parse_stage_json(STAGE, &raw)?;
        info!("Slide designed");
        Ok(design)
    }
}
