use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One symbol's trading data for one calendar date.
///
/// Entries are either real (read from a market report, `trading_status == true`)
/// or synthesized by forward-fill for a date on which the symbol did not trade
/// (`trading_status == false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEntry {
    pub date: NaiveDate,
    pub symbol: String,
    pub company_name: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub average: Decimal,
    pub prev_average: Decimal,
    pub close: Decimal,
    pub prev_close: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub num_trades: u64,
    pub volume: u64,
    /// Traded notional.
    pub value: Decimal,
    /// `true` when the symbol actually traded on `date`.
    pub trading_status: bool,
}

impl TradeEntry {
    /// The composite reconciliation key.
    pub fn key(&self) -> (NaiveDate, String) {
        (self.date, self.symbol.clone())
    }

    /// Synthesizes the carried-forward entry for `date` from this (real) entry.
    ///
    /// Every price collapses onto the last known close, except `prev_average`
    /// which carries the last known average. All activity fields are zero.
    pub fn forward_fill(&self, date: NaiveDate) -> TradeEntry {
        TradeEntry {
            date,
            symbol: self.symbol.clone(),
            company_name: self.company_name.clone(),
            open: self.close,
            high: self.close,
            low: self.close,
            average: self.close,
            prev_average: self.average,
            close: self.close,
            prev_close: self.close,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            num_trades: 0,
            volume: 0,
            value: Decimal::ZERO,
            trading_status: false,
        }
    }
}

/// A trade entry as produced by a report parser, before the report's date is known.
///
/// The date of a market report lives in its file name, not in its rows, so the
/// parser hands back date-free entries and the ingestion step stamps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEntry {
    pub symbol: String,
    pub company_name: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub average: Decimal,
    pub prev_average: Decimal,
    pub close: Decimal,
    pub prev_close: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub num_trades: u64,
    pub volume: u64,
    pub value: Decimal,
    pub trading_status: bool,
}

impl ParsedEntry {
    /// Stamps this entry with the date of the report it came from.
    pub fn on(self, date: NaiveDate) -> TradeEntry {
        TradeEntry {
            date,
            symbol: self.symbol,
            company_name: self.company_name,
            open: self.open,
            high: self.high,
            low: self.low,
            average: self.average,
            prev_average: self.prev_average,
            close: self.close,
            prev_close: self.prev_close,
            change: self.change,
            change_percent: self.change_percent,
            num_trades: self.num_trades,
            volume: self.volume,
            value: self.value,
            trading_status: self.trading_status,
        }
    }
}

/// A market-report file discovered in the input directory, with the date
/// decoded from its name.
///
/// Ordering is by `(date, file_name)`, which is the manifest order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceFileRef {
    pub date: NaiveDate,
    pub file_name: String,
    pub path: PathBuf,
}
