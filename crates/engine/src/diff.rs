use chrono::NaiveDate;
use core_types::{SourceFileRef, TradeEntry};
use std::collections::BTreeSet;

/// What an incremental run has to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncrementalPlan {
    /// Source files to (re)process, in manifest order.
    pub pending: Vec<SourceFileRef>,
    /// Historical entries that survive into reconciliation.
    pub retained: Vec<TradeEntry>,
    /// Historical entries dropped because their date is being reprocessed.
    pub purged: usize,
}

/// Decides which source files to process and which history to keep.
///
/// Without `force_full` a file is pending when its date has no daily file yet,
/// and every historical entry on a pending date is dropped so the fresh parse
/// replaces it. With `force_full` every file is pending and no history is kept.
pub fn plan_incremental(
    manifest: &[SourceFileRef],
    covered: &BTreeSet<NaiveDate>,
    history: Vec<TradeEntry>,
    force_full: bool,
) -> IncrementalPlan {
    if force_full {
        return IncrementalPlan {
            pending: manifest.to_vec(),
            retained: Vec::new(),
            purged: history.len(),
        };
    }

    let pending: Vec<SourceFileRef> = manifest
        .iter()
        .filter(|file| !covered.contains(&file.date))
        .cloned()
        .collect();
    let reprocessed: BTreeSet<NaiveDate> = pending.iter().map(|file| file.date).collect();

    let before = history.len();
    let retained: Vec<TradeEntry> = history
        .into_iter()
        .filter(|entry| !reprocessed.contains(&entry.date))
        .collect();
    let purged = before - retained.len();

    if purged > 0 {
        tracing::info!(purged, dates = reprocessed.len(), "Dropped history for reprocessed dates.");
    }

    IncrementalPlan {
        pending,
        retained,
        purged,
    }
}
