//! # Marketbook Engine
//!
//! Rebuilds the market ledger from a directory of dated report files. A run
//! moves through five phases:
//!
//! 1. **Manifest**: list the input directory and decode each report's date.
//! 2. **Diff**: compare against the daily files already written and reload the
//!    previous combined view, dropping history for any date about to be reprocessed.
//! 3. **Ingest**: parse the pending reports and stamp their entries.
//! 4. **Reconcile**: forward-fill every symbol across every observed date.
//! 5. **Emit**: write the combined, daily and ticker views.
//!
//! [`Pipeline`] drives the phases. Each one is also exposed on its own.

// Declare the modules that constitute this crate.
pub mod cancel;
pub mod diff;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod pipeline;
pub mod reconciler;

// Re-export the key components to create a clean, public-facing API.
pub use cancel::{CancelFlag, Phase};
pub use diff::{plan_incremental, IncrementalPlan};
pub use error::EngineError;
pub use ingest::{ingest, Ingested};
pub use manifest::ManifestBuilder;
pub use pipeline::{Pipeline, RunPlan};
pub use reconciler::{Reconciled, Reconciler};
