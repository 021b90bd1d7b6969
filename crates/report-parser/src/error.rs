use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read report '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in report: {0}")]
    Csv(#[from] csv::Error),

    #[error("Report is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Line {line}: cannot parse column '{column}' from value '{raw}'")]
    InvalidField {
        line: u64,
        column: &'static str,
        raw: String,
    },
}
