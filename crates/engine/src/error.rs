use crate::cancel::Phase;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Cannot list input directory '{path}': {source}")]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output root '{path}': {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid source file naming pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Source files '{first}' and '{second}' both claim {date}")]
    DuplicateSourceDate {
        date: NaiveDate,
        first: String,
        second: String,
    },

    #[error("More than one entry for symbol '{symbol}' on {date}")]
    DuplicateEntry { date: NaiveDate, symbol: String },

    #[error("Run cancelled before the {0} phase")]
    Cancelled(Phase),
}
