//! Deck outline produced by the planner stage.
//!
//! The outline is created once per run and never mutated afterwards.
//! Field names serialize in camelCase to match the event wire format.

use serde::{Deserialize, Serialize};

/// Top-level deck plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub topic: String,
    pub title: String,
    pub subtitle: String,
    pub target_audience: String,
    pub presentation_goal: String,
    pub tone: String,

    /// Visual theme description (mood, palette, style keywords)
    pub visual_theme: String,

    /// Hex color anchoring the deck's visual identity
    pub accent_color: String,

    pub research_context: String,

    /// Slide briefs in presentation order
    pub slides: Vec<SlideBrief>,
}

/// One outline entry describing a single slide's intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideBrief {
    pub title: String,
    pub purpose: String,

    /// Visual direction for layout and atmosphere
    pub visual_advice: String,
}

/// Deck-wide context shared by every designer call in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckMetadata {
    pub topic: String,
    pub title: String,
    pub visual_theme: String,
    pub tone: String,
    pub accent_color: String,
}

impl Outline {
    /// Derive the shared metadata record for the design loop
    pub fn metadata(&self) -> DeckMetadata {
        DeckMetadata {
            topic: self.topic.clone(),
            title: self.title.clone(),
            visual_theme: self.visual_theme.clone(),
            tone: self.tone.clone(),
            accent_color: self.accent_color.clone(),
        }
    }

    /// Top-level string fields as (wire name, value) pairs
    pub fn text_fields(&self) -> [(&'static str, &str); 9] {
        [
            ("topic", &self.topic),
            ("title", &self.title),
            ("subtitle", &self.subtitle),
            ("targetAudience", &self.target_audience),
            ("presentationGoal", &self.presentation_goal),
            ("tone", &self.tone),
            ("visualTheme", &self.visual_theme),
            ("accentColor", &self.accent_color),
            ("researchContext", &self.research_context),
        ]
    }
}

impl SlideBrief {
    pub fn text_fields(&self) -> [(&'static str, &str); 3] {
        [
            ("title", &self.title),
            ("purpose", &self.purpose),
            ("visualAdvice", &self.visual_advice),
        ]
    }
}
