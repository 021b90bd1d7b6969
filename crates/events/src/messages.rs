use crate::error::EventsError;
use chrono::NaiveDate;
use core_types::ViewKind;
use serde::{Deserialize, Serialize};

/// Counts describing one finished run.
///
/// Skip-and-continue conditions never stop a run, so they surface here as
/// counts next to the amount of work that was done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Source files found in the input directory after filtering.
    pub discovered: usize,
    /// Source files parsed in this run.
    pub processed: usize,
    /// Source files the parser failed on.
    pub parse_failures: usize,
    /// Rows read back from the previous combined view.
    pub historical_loaded: usize,
    /// Historical rows dropped because their date was reprocessed.
    pub historical_purged: usize,
    /// Historical rows skipped as malformed.
    pub malformed_rows: usize,
    /// Real `(symbol, date)` entries replaced by a later duplicate.
    pub duplicates_replaced: usize,
    pub real_entries: usize,
    pub synthesized_entries: usize,
    pub dates: usize,
    pub symbols: usize,
    pub daily_files: usize,
    pub ticker_files: usize,
    /// Daily or ticker files that could not be written.
    pub write_failures: usize,
}

impl RunSummary {
    /// `true` when the run had nothing new to ingest.
    pub fn is_noop(&self) -> bool {
        self.processed == 0 && self.parse_failures == 0
    }
}

/// The top-level progress event enum.
/// Every message a pipeline run reports is one of these variants.
///
/// Serialized with `#[serde(tag = "type", content = "payload")]`, so a
/// `FileStarted` event becomes
/// `{"type":"FileStarted","payload":{"index":1,"total":3,...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PipelineEvent {
    /// The manifest is built and diffed against existing outputs.
    ManifestBuilt { discovered: usize, pending: usize },
    /// A source file is about to be parsed. `index` is 1-based.
    FileStarted {
        index: usize,
        total: usize,
        file_name: String,
        date: NaiveDate,
    },
    /// A source file was parsed and its entries stamped.
    FileIngested {
        index: usize,
        total: usize,
        file_name: String,
        entries: usize,
    },
    /// A source file could not be parsed and was skipped.
    FileSkipped {
        index: usize,
        total: usize,
        file_name: String,
        reason: String,
    },
    /// The forward-fill walk finished.
    Reconciled {
        dates: usize,
        symbols: usize,
        real: usize,
        synthesized: usize,
    },
    /// One view was written to disk.
    ViewWritten {
        view: ViewKind,
        files: usize,
        failures: usize,
    },
    /// The run finished successfully.
    Completed(RunSummary),
}

impl PipelineEvent {
    /// Renders the event as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, EventsError> {
        Ok(serde_json::to_string(self)?)
    }
}
