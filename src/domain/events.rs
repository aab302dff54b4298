//! Progress/result events emitted by the generation pipeline, and the
//! control messages a caller sends to drive it.
//!
//! Events serialize as `{"event": <kind>, "data": {...}}`. A run's event
//! sequence ends with either `done` or a terminal `error`; per-slide errors
//! are non-terminal.

use serde::{Deserialize, Serialize};

use super::design::FinalSlide;
use super::outline::Outline;

/// A single pipeline event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Phase progress update
    Status(StatusUpdate),

    /// The full outline, emitted once
    Outline(Outline),

    /// A completed slide
    Slide(FinalSlide),

    /// Run finished normally
    Done(DoneSummary),

    /// Run-level or slide-level failure
    Error(ErrorReport),
}

/// Pipeline phases reported through `status` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPhase {
    Planning,
    Designing,
    GeneratingImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: StatusPhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_slides: Option<usize>,

    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoneSummary {
    /// Number of slides successfully produced
    pub total_slides: usize,
    pub title: String,
}

/// How an error affects the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Run terminated (planner failure, invalid request, internal fault)
    #[default]
    Fatal,

    /// Run terminated by cancellation
    Cancelled,

    /// One slide failed; the run continues
    Slide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_index: Option<usize>,

    #[serde(default)]
    pub kind: ErrorKind,
}

pub const CANCELLED_MESSAGE: &str = "Generation cancelled";

impl Event {
    pub fn planning() -> Self {
        Event::Status(StatusUpdate {
            status: StatusPhase::Planning,
            slide_index: None,
            total_slides: None,
            message: "Planning slide outline...".to_string(),
        })
    }

    pub fn designing(index: usize, total: usize, title: &str) -> Self {
        Event::Status(StatusUpdate {
            status: StatusPhase::Designing,
            slide_index: Some(index),
            total_slides: Some(total),
            message: format!("Designing slide {}/{}: {}", index + 1, total, title),
        })
    }

    pub fn generating_image(index: usize, total: usize) -> Self {
        Event::Status(StatusUpdate {
            status: StatusPhase::GeneratingImage,
            slide_index: Some(index),
            total_slides: Some(total),
            message: format!("Generating image for slide {}/{}...", index + 1, total),
        })
    }

    pub fn done(total_slides: usize, title: impl Into<String>) -> Self {
        Event::Done(DoneSummary {
            total_slides,
            title: title.into(),
        })
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Event::Error(ErrorReport {
            message: message.into(),
            slide_index: None,
            kind: ErrorKind::Fatal,
        })
    }

    pub fn cancelled() -> Self {
        Event::Error(ErrorReport {
            message: CANCELLED_MESSAGE.to_string(),
            slide_index: None,
            kind: ErrorKind::Cancelled,
        })
    }

    pub fn slide_failed(index: usize, message: impl Into<String>) -> Self {
        Event::Error(ErrorReport {
            message: message.into(),
            slide_index: Some(index),
            kind: ErrorKind::Slide,
        })
    }

    /// Wire name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Status(_) => "status",
            Event::Outline(_) => "outline",
            Event::Slide(_) => "slide",
            Event::Done(_) => "done",
            Event::Error(_) => "error",
        }
    }

    /// Whether this event ends the run's sequence
    pub fn is_terminal(&self) -> bool {
        match self {
            Event::Done(_) => true,
            Event::Error(report) => report.kind != ErrorKind::Slide,
            _ => false,
        }
    }
}

/// Inbound control message from a client session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Start a new run, superseding any active one
    Generate {
        #[serde(default)]
        topic: String,

        /// Provider tag; empty selects the configured default
        #[serde(default)]
        provider: String,

        /// Per-run API key overriding the stored key
        #[serde(default, rename = "apiKey")]
        api_key: String,
    },

    /// Cancel the active run, if any
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_format() {
        let event = Event::designing(0, 6, "Intro");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({
                "event": "status",
                "data": {
                    "status": "designing",
                    "slideIndex": 0,
                    "totalSlides": 6,
                    "message": "Designing slide 1/6: Intro"
                }
            })
        );
    }

    #[test]
    fn test_planning_omits_slide_fields() {
        let value = serde_json::to_value(Event::planning()).unwrap();

        assert_eq!(value["data"]["status"], "planning");
        assert!(value["data"].get("slideIndex").is_none());
    }

    #[test]
    fn test_error_event_roundtrip_keeps_kind() {
        let event = Event::slide_failed(3, "bad json");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, event);
        assert!(!parsed.is_terminal());
    }

    #[test]
    fn test_terminal_events() {
        assert!(Event::done(6, "Deck").is_terminal());
        assert!(Event::fatal("boom").is_terminal());
        assert!(Event::cancelled().is_terminal());
        assert!(!Event::planning().is_terminal());
    }

    #[test]
    fn test_error_without_kind_defaults_to_fatal() {
        let parsed: Event =
            serde_json::from_value(json!({"event": "error", "data": {"message": "x"}})).unwrap();

        match parsed {
            Event::Error(report) => assert_eq!(report.kind, ErrorKind::Fatal),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_control_message_parsing() {
        let generate: ControlMessage = serde_json::from_str(
            r#"{"action": "generate", "topic": "Rust", "provider": "qwen", "apiKey": "k"}"#,
        )
        .unwrap();
        assert_eq!(
            generate,
            ControlMessage::Generate {
                topic: "Rust".to_string(),
                provider: "qwen".to_string(),
                api_key: "k".to_string(),
            }
        );

        let cancel: ControlMessage = serde_json::from_str(r#"{"action": "cancel"}"#).unwrap();
        assert_eq!(cancel, ControlMessage::Cancel);

        let bare: ControlMessage = serde_json::from_str(r#"{"action": "generate"}"#).unwrap();
        assert!(matches!(bare, ControlMessage::Generate { ref topic, .. } if topic.is_empty()));
    }
}
