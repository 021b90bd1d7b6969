//! # Marketbook Ledger Crate
//!
//! The durable side of the pipeline. Nothing is persisted except the three CSV
//! views under the output root, so this crate is both the archive writer and
//! the only way a run learns what earlier runs produced.
//!
//! ## Public API
//!
//! - `OutputLayout`: resolves the `combined/`, `daily/` and `ticker/` paths.
//! - `load_history`: reads the combined view back into `TradeEntry` values.
//! - `scan_coverage`: the set of dates that already have a daily file.
//! - `Emitter`: writes the combined, daily and ticker views.
//! - `LedgerError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

// Re-export the key components to create a clean, public-facing API.
pub use error::LedgerError;
pub use layout::OutputLayout;
pub use reader::{load_history, scan_coverage, History};
pub use writer::{Emitter, PruneReport, ViewReport};
