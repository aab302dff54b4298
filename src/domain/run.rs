//! Deck state reconstructed from an event sequence.
//!
//! Clients (and the run log) rebuild the deck by replaying the events a
//! run emitted, in order.

use serde::{Deserialize, Serialize};

use super::design::FinalSlide;
use super::events::{ErrorKind, ErrorReport, Event};
use super::outline::Outline;

/// A generated (or partially generated) deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Outline, once the planner has produced it
    pub outline: Option<Outline>,

    /// Completed slides in emission order
    pub slides: Vec<FinalSlide>,

    /// Per-slide failures
    pub slide_errors: Vec<ErrorReport>,

    /// Current state of the run
    pub state: DeckState,
}

impl Default for Deck {
    fn default() -> Self {
        Self {
            outline: None,
            slides: Vec::new(),
            slide_errors: Vec::new(),
            state: DeckState::Running,
        }
    }
}

impl Deck {
    /// Reconstruct deck state from a sequence of events
    pub fn from_events<'a, I>(events: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut events = events.into_iter().peekable();
        events.peek()?;

        let mut deck = Self::default();
        for event in events {
            deck.apply_event(event);
        }

        Some(deck)
    }

    /// Apply a single event to update deck state
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::Status(_) => {}
            Event::Outline(outline) => {
                self.outline = Some(outline.clone());
            }
            Event::Slide(slide) => {
                self.slides.push(slide.clone());
            }
            Event::Done(_) => {
                self.state = DeckState::Completed;
            }
            Event::Error(report) => match report.kind {
                ErrorKind::Slide => self.slide_errors.push(report.clone()),
                ErrorKind::Cancelled => self.state = DeckState::Cancelled,
                ErrorKind::Fatal => {
                    self.state = DeckState::Failed {
                        error: report.message.clone(),
                    }
                }
            },
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.outline.as_ref().map(|o| o.title.as_str())
    }

    /// Number of slides the outline planned
    pub fn planned_slides(&self) -> usize {
        self.outline.as_ref().map_or(0, |o| o.slides.len())
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DeckState::Running)
    }
}

/// State of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DeckState {
    /// Still emitting events (or stopped without a terminal event)
    Running,

    /// Finished with a `done` event
    Completed,

    /// Terminated by cancellation
    Cancelled,

    /// Terminated by a fatal error
    Failed { error: String },
}

impl Default for DeckState {
    fn default() -> Self {
        Self::Running
    }
}
