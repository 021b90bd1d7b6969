use crate::error::EngineError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The top-level phases of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Manifest,
    Diff,
    Ingest,
    Reconcile,
    Emit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Manifest => "manifest",
            Phase::Diff => "diff",
            Phase::Ingest => "ingest",
            Phase::Reconcile => "reconcile",
            Phase::Emit => "emit",
        };
        f.write_str(name)
    }
}

/// An early-exit request shared between the caller and a running pipeline.
///
/// Clones share the same flag. The pipeline polls it between phases and
/// between source files; work already done in a phase is never rolled back.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fails with [`EngineError::Cancelled`] if cancellation was requested.
    pub fn check(&self, next: Phase) -> Result<(), EngineError> {
        if self.is_cancelled() {
            tracing::warn!(phase = %next, "Cancellation requested, stopping the run.");
            return Err(EngineError::Cancelled(next));
        }
        Ok(())
    }
}
