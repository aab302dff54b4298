//! Prompts tuned for Gemini text and image models.
//!
//! Gemini responds better to narrative, full-sentence direction than to
//! keyword lists, and its image API takes no negative prompt, so the
//! exclusions are written into the prompt itself.

use crate::domain::{DeckMetadata, SlideBrief};

use super::{slide_brief_block, EnhancedPrompt, PromptSet};

pub const PLANNER_SYSTEM: &str = r##"You are a Senior Creative Director at a design agency known for award-winning presentations in every style and industry.

Your task is to turn a topic into a presentation outline with a distinctive, cohesive visual identity. Think like a film director: every slide is a scene with a mood, a focal point and a clear message.

Return ONLY a JSON object with exactly these fields:
- "topic": the original topic
- "title": a compelling presentation title
- "subtitle": a presentation subtitle
- "targetAudience": the intended audience
- "presentationGoal": the key takeaway
- "tone": the emotional tone
- "visualTheme": a specific, atmospheric theme (palette, light or dark mood, style keywords)
- "accentColor": a hex color that anchors the identity
- "researchContext": brief background research
- "slides": an array of 6 to 8 objects, each with "title", "purpose" and "visualAdvice"

The generated background image is always fully visible; readability comes from text-shadow and glassmorphism cards placed away from the image's focal area. Describe each slide's visualAdvice with that in mind.

Every field is required and must not be empty. Write all visible text in the same language as the topic."##;

pub const PLANNER_USER: &str = r#"Design an extraordinary presentation for the following topic. Analyze the topic carefully and choose the most appropriate visual theme:

"{topic}"

Return ONLY the JSON object."#;

pub const DESIGNER_SYSTEM: &str = r##"You are a world-class presentation designer who thinks in code. You adapt fluidly to any visual theme: futuristic launches, warm brand stories, academic talks, bold pitches.

Return ONLY a JSON object with these fields:
- "title": slide title
- "subtitle": slide subtitle (may be empty)
- "content": array of key points
- "imagePrompt": a vivid English description of the background image, with its visual interest placed away from the text area
- "htmlContent": complete HTML for the slide overlay, every style inline
- "designDirective": a short note on the design decisions
- "stats": array of {"value", "label"} objects, may be empty

The frontend draws the background image beneath your HTML. Do not use <img> tags, class names, <style> blocks, or any full-screen overlay. Refer to the background image URL, if ever needed, with the token __SLIDE_IMAGE__. The root element is a 16:9 container with position:relative, width:100%, height:100% and overflow:hidden."##;

pub fn build_designer_user(metadata: &DeckMetadata, brief: &SlideBrief, index: usize) -> String {
    format!(
        "Create slide #{number} of the presentation \"{title}\".\n\n\
         **Project Identity:**\n{block}\n\n\
         Requirements: ALL styling inline. No <img> tags. No full-screen overlay or mask. \
         Use accent color {accent} for highlights.\n\n\
         Craft this slide now. Make it extraordinary.",
        number = index + 1,
        title = metadata.title,
        block = slide_brief_block(metadata, brief),
        accent = metadata.accent_color,
    )
}

const PREFIX: &str = "Create a 16:9 widescreen presentation background image. ";

const SUFFIX: &str = " The image should have soft, evenly distributed lighting \
     with smooth color transitions, making it ideal for overlaying text and UI elements. \
     The composition should be atmospheric and environmental with no single dominant focal point. \
     DO NOT include any text, watermarks, logos, written words, or human faces in this image.";

pub fn enhance_image_prompt(prompt: &str) -> EnhancedPrompt {
    EnhancedPrompt::plain(format!("{}{}{}", PREFIX, prompt, SUFFIX))
}

pub fn prompt_set() -> PromptSet {
    PromptSet {
        planner_system: PLANNER_SYSTEM,
        planner_user_template: PLANNER_USER,
        designer_system: DESIGNER_SYSTEM,
        designer_user: build_designer_user,
        enhance_image: enhance_image_prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_has_no_negative_prompt() {
        let enhanced = enhance_image_prompt("desert dunes at dusk");

        assert!(enhanced.prompt.contains("desert dunes at dusk"));
        assert!(enhanced.prompt.contains("DO NOT include any text"));
        assert!(enhanced.negative_prompt.is_none());
    }
}
