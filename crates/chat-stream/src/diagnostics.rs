use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::errors::MalformedFrame;

/// Receives warnings about frames that were dropped.
pub trait DiagnosticSink: Send + Sync {
    fn malformed_frame(&self, warning: &MalformedFrame);
}

/// Default sink: logs each warning through `tracing` at `warn` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn malformed_frame(&self, warning: &MalformedFrame) {
        warn!(
            frame_index = warning.frame_index,
            payload = %warning.payload,
            reason = %warning.reason,
            "failed to parse stream frame; skipping"
        );
    }
}

/// Sink that keeps every warning in memory.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    warnings: Arc<Mutex<Vec<MalformedFrame>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the warnings recorded so far.
    pub fn warnings(&self) -> Vec<MalformedFrame> {
        match self.warnings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn malformed_frame(&self, warning: &MalformedFrame) {
        let mut guard = match self.warnings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(warning.clone());
    }
}
