use crate::error::LedgerError;
use crate::layout::OutputLayout;
use chrono::NaiveDate;
use configuration::MalformedFieldPolicy;
use core_types::schema::{self, COLUMNS, FIELD_COUNT};
use core_types::{TradeEntry, ViewKind};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

/// The previous run's combined view, reloaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub entries: Vec<TradeEntry>,
    /// Rows that were skipped instead of loaded.
    pub malformed_rows: usize,
}

/// Loads the combined view at `path` back into memory.
///
/// A missing file is an empty history. Rows shorter than the schema, rows
/// without a usable date or symbol, and rows the CSV layer cannot decode are
/// skipped and counted. An unparsable numeric or status field is handled per
/// `policy`.
pub fn load_history(path: &Path, policy: MalformedFieldPolicy) -> Result<History, LedgerError> {
    let mut reader = match csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
    {
        Ok(reader) => reader,
        Err(e) => {
            if matches!(e.kind(), csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound) {
                tracing::info!(path = %path.display(), "No combined view yet, starting without history.");
                return Ok(History::default());
            }
            return Err(LedgerError::csv(path, e));
        }
    };

    let mut history = History::default();
    for result in reader.records() {
        let decoded = result
            .map_err(|e| LedgerError::MalformedRow {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                reason: e.to_string(),
            })
            .and_then(|record| decode_row(&record, policy));

        match decoded {
            Ok(entry) => history.entries.push(entry),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping malformed historical row.");
                history.malformed_rows += 1;
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        loaded = history.entries.len(),
        malformed = history.malformed_rows,
        "Loaded historical ledger."
    );
    Ok(history)
}

/// Collects the dates that already have a daily file.
///
/// A missing daily directory means nothing is covered. Names that are not
/// daily file names are ignored.
pub fn scan_coverage(layout: &OutputLayout) -> Result<BTreeSet<NaiveDate>, LedgerError> {
    let dir = layout.view_dir(ViewKind::Daily);
    let listing = match std::fs::read_dir(&dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(LedgerError::io(&dir, e)),
    };

    let mut covered = BTreeSet::new();
    for item in listing {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable daily directory entry.");
                continue;
            }
        };
        if !item.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = item.file_name();
        match name.to_str().and_then(|n| layout.date_of_daily_file(n)) {
            Some(date) => {
                covered.insert(date);
            }
            None => tracing::debug!(file = ?name, "Ignoring non-daily file in the daily view."),
        }
    }

    Ok(covered)
}

fn decode_row(record: &StringRecord, policy: MalformedFieldPolicy) -> Result<TradeEntry, LedgerError> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    if record.len() < FIELD_COUNT {
        return Err(LedgerError::MalformedRow {
            line,
            reason: format!("expected {FIELD_COUNT} fields, found {}", record.len()),
        });
    }

    let row = RowDecoder { record, line, policy };

    // Without a date or symbol the row has no reconciliation key.
    let date = schema::parse_date(row.text(0)).map_err(|e| LedgerError::MalformedRow {
        line,
        reason: e.to_string(),
    })?;
    let symbol = row.text(2);
    if symbol.is_empty() {
        return Err(LedgerError::MalformedRow {
            line,
            reason: "empty symbol".to_string(),
        });
    }

    Ok(TradeEntry {
        date,
        company_name: row.text(1).to_string(),
        symbol: symbol.to_string(),
        open: row.decimal(3)?,
        high: row.decimal(4)?,
        low: row.decimal(5)?,
        average: row.decimal(6)?,
        prev_average: row.decimal(7)?,
        close: row.decimal(8)?,
        prev_close: row.decimal(9)?,
        change: row.decimal(10)?,
        change_percent: row.decimal(11)?,
        num_trades: row.integer(12)?,
        volume: row.integer(13)?,
        value: row.decimal(14)?,
        trading_status: row.status(15)?,
    })
}

struct RowDecoder<'r> {
    record: &'r StringRecord,
    line: u64,
    policy: MalformedFieldPolicy,
}

impl RowDecoder<'_> {
    fn text(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn decimal(&self, index: usize) -> Result<Decimal, LedgerError> {
        let raw = self.text(index);
        Decimal::from_str(raw).or_else(|_| self.degrade(index, raw, Decimal::ZERO))
    }

    fn integer(&self, index: usize) -> Result<u64, LedgerError> {
        let raw = self.text(index);
        raw.parse::<u64>().or_else(|_| self.degrade(index, raw, 0))
    }

    fn status(&self, index: usize) -> Result<bool, LedgerError> {
        let raw = self.text(index);
        schema::parse_trading_status(raw).or_else(|_| self.degrade(index, raw, false))
    }

    fn degrade<T>(&self, index: usize, raw: &str, zero: T) -> Result<T, LedgerError> {
        match self.policy {
            MalformedFieldPolicy::Zero => {
                tracing::warn!(
                    line = self.line,
                    column = COLUMNS[index],
                    raw,
                    "Unparsable historical field read as zero."
                );
                Ok(zero)
            }
            MalformedFieldPolicy::RejectRow => Err(LedgerError::MalformedRow {
                line: self.line,
                reason: format!("cannot parse {} from '{raw}'", COLUMNS[index]),
            }),
        }
    }
}
