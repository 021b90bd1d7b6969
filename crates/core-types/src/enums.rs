use serde::{Deserialize, Serialize};
use std::fmt;

/// The three projections of the reconciled set written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    /// The single file holding the entire reconciled ledger.
    Combined,
    /// One file per trading date.
    Daily,
    /// One file per symbol.
    Ticker,
}

impl ViewKind {
    /// The directory name of this view below the output root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ViewKind::Combined => "combined",
            ViewKind::Daily => "daily",
            ViewKind::Ticker => "ticker",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
