//! Per-slide design output and the final assembled slide.

use serde::{Deserialize, Serialize};

use super::outline::SlideBrief;

/// Token in designer markup replaced by the resolved image location
pub const IMAGE_PLACEHOLDER: &str = "__SLIDE_IMAGE__";

/// Structured design for one slide, produced by the designer stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDesign {
    pub title: String,

    #[serde(default)]
    pub subtitle: String,

    /// Content bullets in display order
    pub content: Vec<String>,

    /// Background image description handed to the artist
    pub image_prompt: String,

    /// Slide markup (inline-styled HTML)
    pub html_content: String,

    /// Short rationale for the design choices
    #[serde(default)]
    pub design_directive: String,

    #[serde(default)]
    pub stats: Vec<SlideStat>,
}

/// A highlighted (value, label) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideStat {
    pub value: String,
    pub label: String,
}

impl SlideDesign {
    /// Markup with the image placeholder substituted
    pub fn render_html(&self, image_url: &str) -> String {
        self.html_content.replace(IMAGE_PLACEHOLDER, image_url)
    }
}

/// A completed slide; emitted once and never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalSlide {
    /// 0-based position in the outline
    pub index: usize,
    pub outline: SlideBrief,
    pub design: SlideDesign,
    pub image_url: String,
    pub final_html: String,
}

impl FinalSlide {
    pub fn new(index: usize, outline: SlideBrief, design: SlideDesign, image_url: String) -> Self {
        let final_html = design.render_html(&image_url);
        Self {
            index,
            outline,
            design,
            image_url,
            final_html,
        }
    }
}
