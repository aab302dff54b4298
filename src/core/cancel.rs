//! Cooperative cancellation flag shared between a caller and a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, sticky cancellation flag.
///
/// Once set it stays set; the pipeline only reads it at stage boundaries
/// and never clears it. Clearing is the caller's job before reusing the
/// handle for a new run.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Reset the flag for the next run
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
