//! Extraction of JSON payloads from raw model responses.
//!
//! Models wrap JSON in reasoning blocks, markdown fences, or prose. The
//! stages strip those before handing the text to serde.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::error;

use crate::adapters::LlmError;

use super::limits::LimitViolation;

/// Failure of a planner or designer stage
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("{stage} JSON parse failed: {source}")]
    Parse {
        stage: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} validation failed: {violation}")]
    Validation {
        stage: &'static str,
        violation: LimitViolation,
    },
}

fn think_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<think>[\s\S]*?</think>").expect("valid regex"))
}

fn opening_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```(?:json)?\s*\n?").expect("valid regex"))
}

fn closing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n?```\s*$").expect("valid regex"))
}

/// Pull the JSON object text out of a raw model response.
///
/// Strips `<think>` blocks and markdown fences; if the remainder still
/// does not start with `{`, keeps the span from the first `{` to the last
/// `}`. Text without braces is returned as-is (and will fail to parse).
pub fn extract_json(raw: &str) -> String {
    let text = think_block().replace_all(raw.trim(), "");
    let text = text.trim();
    let text = opening_fence().replace(text, "");
    let text = closing_fence().replace(&text, "");
    let text = text.trim();

    if !text.starts_with('{') {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                return text[start..=end].to_string();
            }
        }
    }

    text.to_string()
}

/// Extract and deserialize a stage's JSON payload
pub fn parse_stage_json<T: DeserializeOwned>(stage: &'static str, raw: &str) -> Result<T, StageError> {
    let text = extract_json(raw);

    serde_json::from_str(&text).map_err(|source| {
        error!(stage, error = %source, head = %preview(&text, 500), "Failed to parse stage JSON");
        StageError::Parse { stage, source }
    })
}

/// First `max_chars` characters of `text`, for logs and placeholders
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
