use crate::messages::PipelineEvent;
use std::sync::Mutex;

/// The receiving end of progress reporting.
///
/// The pipeline calls `emit` synchronously between units of work. Implementors
/// must be `Sync` because daily and ticker files may be written from a thread pool.
pub trait ProgressSink: Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Records every event in order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the events recorded so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: &PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn emit(&self, event: &PipelineEvent) {
        (**self).emit(event)
    }
}
