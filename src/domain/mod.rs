//! Domain types for the deck generation pipeline.
//!
//! This module contains the core data structures:
//! - Outline: Deck plan produced by the planner
//! - Design: Per-slide designs and final slides
//! - Events: Progress/result events and inbound control messages
//! - Run: Deck reconstruction from events
//! - Provider: Backend selection tags

pub mod design;
pub mod events;
pub mod outline;
pub mod provider;
pub mod run;

// Re-export commonly used types
pub use design::{FinalSlide, SlideDesign, SlideStat, IMAGE_PLACEHOLDER};
pub use events::{
    ControlMessage, DoneSummary, ErrorKind, ErrorReport, Event, StatusPhase, StatusUpdate,
    CANCELLED_MESSAGE,
};
pub use outline::{DeckMetadata, Outline, SlideBrief};
pub use provider::{Provider, UnknownProvider};
pub use run::{Deck, DeckState};
