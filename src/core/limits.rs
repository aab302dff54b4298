//! Generation limits and their enforcement.
//!
//! Bounds the run on:
//! - Topic length
//! - Outline slide count and required fields
//! - Per-call timeouts for chat and image requests

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Outline;

/// Limits applied to a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationLimits {
    /// Maximum topic length in characters (default: 500)
    #[serde(default = "default_max_topic_chars")]
    pub max_topic_chars: usize,

    /// Minimum slides an outline may contain (default: 6)
    #[serde(default = "default_min_slides")]
    pub min_slides: usize,

    /// Maximum slides an outline may contain (default: 8)
    #[serde(default = "default_max_slides")]
    pub max_slides: usize,

    /// Timeout for one chat completion in seconds (default: 180)
    #[serde(default = "default_chat_timeout")]
    pub chat_timeout_seconds: u64,

    /// Timeout for one image generation in seconds (default: 180)
    #[serde(default = "default_image_timeout")]
    pub image_timeout_seconds: u64,
}

fn default_max_topic_chars() -> usize {
    500
}
fn default_min_slides() -> usize {
    6
}
fn default_max_slides() -> usize {
    8
}
fn default_chat_timeout() -> u64 {
    180
}
fn default_image_timeout() -> u64 {
    180
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_topic_chars: default_max_topic_chars(),
            min_slides: default_min_slides(),
            max_slides: default_max_slides(),
            chat_timeout_seconds: default_chat_timeout(),
            image_timeout_seconds: default_image_timeout(),
        }
    }
}

impl GenerationLimits {
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_seconds)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_seconds)
    }

    /// Validate a topic before starting a run; returns it trimmed
    pub fn validate_topic<'a>(&self, topic: &'a str) -> Result<&'a str, LimitViolation> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(LimitViolation::EmptyTopic);
        }

        let chars = topic.chars().count();
        if chars > self.max_topic_chars {
            return Err(LimitViolation::TopicTooLong {
                actual: chars,
                limit: self.max_topic_chars,
            });
        }

        Ok(topic)
    }

    /// Check a planner outline: slide count in range, no empty strings
    pub fn check_outline(&self, outline: &Outline) -> Result<(), LimitViolation> {
        let count = outline.slides.len();
        if count < self.min_slides || count > self.max_slides {
            return Err(LimitViolation::SlideCount {
                actual: count,
                min: self.min_slides,
                max: self.max_slides,
            });
        }

        for (field, value) in outline.text_fields() {
            if value.trim().is_empty() {
                return Err(LimitViolation::EmptyField {
                    field: field.to_string(),
                });
            }
        }

        for (index, brief) in outline.slides.iter().enumerate() {
            for (field, value) in brief.text_fields() {
                if value.trim().is_empty() {
                    return Err(LimitViolation::EmptyField {
                        field: format!("slides[{}].{}", index, field),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Types of limit violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LimitViolation {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Topic is too long: {actual} characters (limit: {limit})")]
    TopicTooLong { actual: usize, limit: usize },

    #[error("Outline has {actual} slides (expected {min}-{max})")]
    SlideCount { actual: usize, min: usize, max: usize },

    #[error("Required field '{field}' is empty")]
    EmptyField { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SlideBrief;

    fn outline_with(slides: usize) -> Outline {
        Outline {
            topic: "t".to_string(),
            title: "T".to_string(),
            subtitle: "s".to_string(),
            target_audience: "a".to_string(),
            presentation_goal: "g".to_string(),
            tone: "calm".to_string(),
            visual_theme: "dark".to_string(),
            accent_color: "#06b6d4".to_string(),
            research_context: "r".to_string(),
            slides: (0..slides)
                .map(|i| SlideBrief {
                    title: format!("S{}", i),
                    purpose: "p".to_string(),
                    visual_advice: "v".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_limits() {
        let limits = GenerationLimits::default();
        assert_eq!(limits.min_slides, 6);
        assert_eq!(limits.max_slides, 8);
        assert_eq!(limits.chat_timeout(), Duration::from_secs(180));
    }

    #[test]
    fn test_slide_count_bounds() {
        let limits = GenerationLimits::default();

        assert!(limits.check_outline(&outline_with(6)).is_ok());
        assert!(limits.check_outline(&outline_with(8)).is_ok());
        assert_eq!(
            limits.check_outline(&outline_with(5)),
            Err(LimitViolation::SlideCount {
                actual: 5,
                min: 6,
                max: 8
            })
        );
        assert!(limits.check_outline(&outline_with(9)).is_err());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let limits = GenerationLimits::default();

        let mut outline = outline_with(6);
        outline.accent_color = "  ".to_string();
        assert_eq!(
            limits.check_outline(&outline),
            Err(LimitViolation::EmptyField {
                field: "accentColor".to_string()
            })
        );

        let mut outline = outline_with(6);
        outline.slides[2].purpose.clear();
        assert_eq!(
            limits.check_outline(&outline),
            Err(LimitViolation::EmptyField {
                field: "slides[2].purpose".to_string()
            })
        );
    }

    #[test]
    fn test_topic_validation() {
        let limits = GenerationLimits {
            max_topic_chars: 5,
            ..Default::default()
        };

        assert_eq!(limits.validate_topic("  rust "), Ok("rust"));
        assert_eq!(limits.validate_topic("   "), Err(LimitViolation::EmptyTopic));
        assert!(matches!(
            limits.validate_topic("too long topic"),
            Err(LimitViolation::TopicTooLong { actual: 14, limit: 5 })
        ));
    }

    #[test]
    fn test_limits_yaml_defaults() {
        let limits: GenerationLimits = serde_yaml::from_str("max_slides: 10").unwrap();
        assert_eq!(limits.max_slides, 10);
        assert_eq!(limits.min_slides, 6);
    }
}
