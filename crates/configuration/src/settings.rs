use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub naming: Naming,
    pub reconcile: Reconcile,
    pub logging: Logging,
}

/// Where market reports are read from and where the three views are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Directory holding the dated market-report files.
    pub input_dir: PathBuf,
    /// Root of the `combined/`, `daily/` and `ticker/` views.
    pub output_dir: PathBuf,
}

/// File naming conventions on both sides of the pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Naming {
    /// Fixed suffix following the date token of a source file name.
    pub source_suffix: String,
    /// Source files starting with this prefix are transient/lock files and ignored.
    pub excluded_prefix: String,
    /// File name of the combined view inside `combined/`.
    pub combined_file: String,
    /// A daily file is named `YYYY-MM-DD` followed by this suffix.
    pub daily_suffix: String,
    /// A ticker file is named `<symbol>_` followed by this suffix.
    pub ticker_suffix: String,
}

/// Knobs of the reconciliation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Reconcile {
    /// Reprocess every source file and discard all history.
    pub force_full: bool,
    /// What to do when two real entries share a `(symbol, date)` key.
    pub duplicate_entries: DuplicatePolicy,
    /// What to do when two source files claim the same date.
    pub duplicate_source_dates: DuplicatePolicy,
    /// What to do with an unparsable numeric field in a historical row.
    pub malformed_fields: MalformedFieldPolicy,
    /// Write the daily and ticker views on the rayon thread pool.
    pub parallel_emit: bool,
}

/// Logging output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When non-empty, logs are also written to a daily-rolling file in this directory.
    pub directory: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DuplicatePolicy {
    /// Keep the last occurrence and log the replaced one.
    #[default]
    LastWins,
    /// Abort the run.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum MalformedFieldPolicy {
    /// Degrade the field to zero and keep the row.
    #[default]
    Zero,
    /// Drop the whole row.
    RejectRow,
}

// --- Default Implementations ---
// This allows a user to omit any section (or the whole file) and still
// have a runnable configuration.

impl Default for Paths {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/reports"),
            output_dir: PathBuf::from("data/output"),
        }
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            source_suffix: ".csv".to_string(),
            excluded_prefix: "~$".to_string(),
            combined_file: "all_trades.csv".to_string(),
            daily_suffix: ".csv".to_string(),
            ticker_suffix: "history.csv".to_string(),
        }
    }
}

impl Default for Reconcile {
    fn default() -> Self {
        Self {
            force_full: false,
            duplicate_entries: DuplicatePolicy::LastWins,
            duplicate_source_dates: DuplicatePolicy::LastWins,
            malformed_fields: MalformedFieldPolicy::Zero,
            parallel_emit: true,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: String::new(),
        }
    }
}
