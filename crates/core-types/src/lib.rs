//! # Marketbook Core Types
//!
//! The shared vocabulary of the workspace. Every other crate speaks in terms of
//! the structures defined here: a [`TradeEntry`] is one symbol's trading data on
//! one calendar date, a [`SourceFileRef`] points at one dated market-report file.
//!
//! This is a Layer 0 crate. It has no knowledge of the filesystem layout, the
//! configuration, or the reconciliation algorithm.

pub mod enums;
pub mod error;
pub mod schema;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::ViewKind;
pub use error::CoreError;
pub use structs::{ParsedEntry, SourceFileRef, TradeEntry};
