//! # Marketbook Report Parser
//!
//! Turns one market-report file into the list of entries it contains. A report
//! covers a single trading date, but that date is encoded in the file name, so
//! parsers return date-free [`ParsedEntry`] values and leave stamping to the caller.

use core_types::ParsedEntry;
use std::path::Path;

pub mod csv_report;
pub mod error;

// --- Public API ---
pub use csv_report::CsvReportParser;
pub use error::ParseError;

/// The contract between the reconciliation engine and whatever understands the
/// raw report format. Swapping the implementation (CSV, spreadsheet, a mock in
/// tests) never touches the engine.
pub trait ReportParser: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Parses every entry of the report at `path`.
    ///
    /// An `Err` means the whole file is unusable. Implementations may skip
    /// individual bad rows, but must log each one they skip.
    fn parse(&self, path: &Path) -> Result<Vec<ParsedEntry>, ParseError>;
}
