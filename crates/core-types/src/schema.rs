//! The fixed 16-column tabular schema shared by every emitted view.
//!
//! Dates are `YYYY-MM-DD`, prices and price changes carry 3 decimals,
//! percentages and traded value carry 2, and `TradingStatus` is a literal
//! `true` / `false` token.

use crate::error::CoreError;
use crate::structs::TradeEntry;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Column order of every emitted file.
pub const COLUMNS: [&str; 16] = [
    "Date",
    "CompanyName",
    "Symbol",
    "OpenPrice",
    "HighPrice",
    "LowPrice",
    "AveragePrice",
    "PrevAveragePrice",
    "ClosePrice",
    "PrevClosePrice",
    "Change",
    "ChangePercent",
    "NumTrades",
    "Volume",
    "Value",
    "TradingStatus",
];

/// Number of fields a row must carry to be read back.
pub const FIELD_COUNT: usize = COLUMNS.len();

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const PRICE_DP: u32 = 3;
pub const PERCENT_DP: u32 = 2;

/// Formats a price-like decimal with exactly [`PRICE_DP`] decimals.
pub fn format_price(value: Decimal) -> String {
    format_fixed(value, PRICE_DP)
}

/// Formats a percentage or traded value with exactly [`PERCENT_DP`] decimals.
pub fn format_percent(value: Decimal) -> String {
    format_fixed(value, PERCENT_DP)
}

fn format_fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| CoreError::InvalidInput("date".to_string(), format!("'{raw}': {e}")))
}

pub fn parse_trading_status(raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(CoreError::InvalidInput(
            "trading status".to_string(),
            format!("expected 'true' or 'false', got '{other}'"),
        )),
    }
}

/// Renders an entry as one row in [`COLUMNS`] order.
pub fn to_record(entry: &TradeEntry) -> [String; FIELD_COUNT] {
    [
        format_date(entry.date),
        entry.company_name.clone(),
        entry.symbol.clone(),
        format_price(entry.open),
        format_price(entry.high),
        format_price(entry.low),
        format_price(entry.average),
        format_price(entry.prev_average),
        format_price(entry.close),
        format_price(entry.prev_close),
        format_price(entry.change),
        format_percent(entry.change_percent),
        entry.num_trades.to_string(),
        entry.volume.to_string(),
        format_percent(entry.value),
        entry.trading_status.to_string(),
    ]
}
