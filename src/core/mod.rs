//! Core generation logic.
//!
//! This module contains:
//! - Planner, Designer, Artist: the three pipeline stages
//! - Orchestrator: sequences the stages into an event stream
//! - Session: one active run per caller
//! - RunLog: append-only event logging
//! - Limits, extraction and cancellation helpers

pub mod artist;
pub mod cancel;
pub mod designer;
pub mod extract;
pub mod limits;
pub mod orchestrator;
pub mod planner;
pub mod run_log;
pub mod session;

// Re-export commonly used types
pub use artist::{placeholder_image_url, Artist, PLACEHOLDER_IMAGE_URL};
pub use cancel::CancelHandle;
pub use designer::Designer;
pub use extract::{extract_json, StageError};
pub use limits::{GenerationLimits, LimitViolation};
pub use orchestrator::{public_image_url, EventStream, Orchestrator};
pub use planner::Planner;
pub use run_log::{list_runs, LogEntry, RunLog};
pub use session::{PipelineFactory, ProviderPipelineFactory, Session};
