//! aippt - AI slide deck generation pipeline
//!
//! Turns a topic into a designed slide deck by chaining three model-backed
//! stages and streaming progress as events.
//!
//! # Architecture
//!
//! - The planner asks a text model for a deck outline
//! - The designer turns each outline entry into slide markup
//! - The artist generates a background image per slide, falling back to a
//!   placeholder when the image model fails
//!
//! The orchestrator runs these stages sequentially and emits `status`,
//! `outline`, `slide`, `done` and `error` events. Failures are contained per
//! slide; cancellation is cooperative.
//!
//! # Modules
//!
//! - `adapters`: Model provider clients (Qwen, Gemini) and image storage
//! - `prompts`: Per-provider prompt bundles
//! - `core`: Stages, orchestrator, session and run log
//! - `domain`: Data contracts (Outline, SlideDesign, Event, Deck)
//! - `config`: Configuration discovery and API keys
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Generate a deck, streaming events as JSON lines
//! aippt generate "The history of espresso"
//!
//! # Check a logged run
//! aippt status <run-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod prompts;

// Re-export main types at crate root for convenience
pub use crate::adapters::{LlmClient, LlmError};
pub use crate::config::{KeyStore, ResolvedConfig};
pub use crate::core::{CancelHandle, EventStream, Orchestrator, Session};
pub use crate::domain::{ControlMessage, Deck, Event, FinalSlide, Outline, Provider, SlideDesign};
pub use crate::prompts::{PromptRegistry, PromptSet};
