//! Prompts tuned for the qwen text model and qwen-image-max.

use crate::domain::{DeckMetadata, SlideBrief};

use super::{slide_brief_block, EnhancedPrompt, PromptSet};

pub const PLANNER_SYSTEM: &str = r##"You are a presentation architect who creates visually striking presentation outlines.

You MUST return a valid JSON object. Do NOT include markdown fences, explanations, or any text outside the JSON.

Required JSON schema:
{
  "topic": "string - the original topic",
  "title": "string - compelling presentation title",
  "subtitle": "string - presentation subtitle",
  "targetAudience": "string - intended audience",
  "presentationGoal": "string - key takeaway for the audience",
  "tone": "string - emotional tone of the presentation",
  "visualTheme": "string - specific visual theme: color mood (dark or light), style keywords, atmosphere",
  "accentColor": "string - hex color code anchoring the visual identity",
  "researchContext": "string - brief background research on the topic",
  "slides": [
    {
      "title": "string - slide title",
      "purpose": "string - what this slide communicates",
      "visualAdvice": "string - cinematic visual direction for layout and atmosphere"
    }
  ]
}

Choose the visual theme that best matches the subject and audience; never answer with a generic theme such as "modern" or "clean".
Pick an accent color that harmonizes with the theme: vivid neon tones for dark technology themes, earthy tones for natural themes, refined tones for light professional themes.

The background image stays fully visible on every slide. Text readability comes from text-shadow and localized glassmorphism cards, never from a full-screen overlay. Each visualAdvice must say where the image's visual interest sits, where the accent color appears, the layout geometry, and where text and cards are placed.

Slide structure:
- Slide 1: bold title slide
- Slide 2: context or problem statement
- Slides 3-6: core content
- Slide 7: summary or call to action
- Slide 8 (optional): closing

Constraints:
- All fields are required and must not be empty.
- The slides array must contain 6 to 8 items.
- All visible text MUST use the same language as the topic."##;

pub const PLANNER_USER: &str = r#"Create a stunning presentation outline for the following topic. Analyze the topic and choose the most appropriate visual theme:

"{topic}"

Return ONLY the JSON object."#;

pub const DESIGNER_SYSTEM: &str = r##"You are a presentation slide designer producing production-ready HTML with inline CSS.

Use inline styles (style="...") for ALL styling. No class names, no <style> blocks, no <img> tags.

You MUST return a valid JSON object and nothing else:
{
  "title": "string - slide title",
  "subtitle": "string - slide subtitle, may be empty",
  "content": ["string - key point"],
  "imagePrompt": "string - detailed English description of the background image",
  "htmlContent": "string - complete HTML with inline styles for the slide overlay",
  "designDirective": "string - brief note on design choices",
  "stats": [{"value": "string", "label": "string"}]
}

Rendering: your HTML is composited on top of a full-bleed background image supplied by the frontend. Never add a full-screen overlay or color wash; keep the image fully visible. Use strong text-shadow on text and backdrop-filter glass on cards. Where the slide needs to reference the background image URL, write the token __SLIDE_IMAGE__.

The root element must be a 16:9 container with position:relative, width:100%, height:100% and overflow:hidden. Adapt every color to the deck's visual theme and use the accent color for highlights."##;

pub fn build_designer_user(metadata: &DeckMetadata, brief: &SlideBrief, index: usize) -> String {
    format!(
        "Design slide #{number} for this presentation.\n\n\
         Project metadata:\n{block}\n\n\
         Remember: ALL styling must be inline. No <img> tags. No full-screen overlay. \
         Use accent color {accent} for highlights.\n\n\
         Return ONLY the JSON object.",
        number = index + 1,
        block = slide_brief_block(metadata, brief),
        accent = metadata.accent_color,
    )
}

const PREFIX: &str = "Cinematic presentation slide background, 16:9 ultra-wide landscape, \
     photorealistic rendering, ";

const SUFFIX: &str = ", volumetric soft ambient lighting, natural color grading, \
     subtle depth of field, rich material textures, \
     8K resolution, masterful composition, atmospheric perspective";

const NEGATIVE_PROMPT: &str = "text, watermark, logo, letter, word, signature, label, caption, title, \
     human face, close-up portrait, person, figure, hands, \
     blurry, low quality, pixelated, noisy, grainy, compression artifacts, \
     distorted, deformed, ugly, oversaturated, underexposed, overexposed, \
     flat lighting, harsh shadows, lens flare, chromatic aberration, \
     cartoon, anime, illustration, painting style, 3D render artifact";

/// Maximum prompt length accepted by qwen-image-max, in characters
pub const MAX_IMAGE_PROMPT_CHARS: usize = 800;

/// Wrap the prompt with scene and quality anchors; truncate the middle so
/// prefix and suffix always survive the length cap.
pub fn enhance_image_prompt(prompt: &str) -> EnhancedPrompt {
    let frame_len = PREFIX.chars().count() + SUFFIX.chars().count();
    let body: String = if frame_len + prompt.chars().count() > MAX_IMAGE_PROMPT_CHARS {
        prompt
            .chars()
            .take(MAX_IMAGE_PROMPT_CHARS.saturating_sub(frame_len))
            .collect()
    } else {
        prompt.to_string()
    };

    EnhancedPrompt {
        prompt: format!("{}{}{}", PREFIX, body, SUFFIX),
        negative_prompt: Some(NEGATIVE_PROMPT.to_string()),
    }
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
