//! # Marketbook Events
//!
//! This crate defines the progress events a reconciliation run reports to
//! whoever is driving it: a terminal progress bar, a JSON-lines relay for an
//! orchestrator, or a test that records what happened.
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the definitive
//! language for progress reporting. The engine never formats progress lines itself.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;
pub mod sink;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::{PipelineEvent, RunSummary};
pub use sink::{CollectingSink, NullSink, ProgressSink};
