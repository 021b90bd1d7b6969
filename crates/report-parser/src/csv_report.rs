use crate::error::ParseError;
use crate::ReportParser;
use core_types::ParsedEntry;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Reads daily market reports stored as CSV.
///
/// Columns are located by header name, case-insensitively and ignoring
/// spaces and punctuation, so `Close Price`, `close_price` and `ClosePrice`
/// all resolve to the same column. Extra columns are ignored. `TradingStatus`
/// is optional; without it a symbol counts as traded when it has trades.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportParser;

impl CsvReportParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses report rows from any reader.
    pub fn parse_reader<R: Read>(&self, input: R) -> Result<Vec<ParsedEntry>, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            match columns.entry(&record, line) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => tracing::debug!(line, "Skipping report row without a symbol."),
                Err(e) => tracing::warn!(error = %e, "Skipping malformed report row."),
            }
        }

        Ok(entries)
    }
}

impl ReportParser for CsvReportParser {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn parse(&self, path: &Path) -> Result<Vec<ParsedEntry>, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_reader(file)
    }
}

/// Positions of the report columns within a record.
struct ColumnIndex {
    symbol: usize,
    company_name: usize,
    open: usize,
    high: usize,
    low: usize,
    average: usize,
    prev_average: usize,
    close: usize,
    prev_close: usize,
    change: usize,
    change_percent: usize,
    num_trades: usize,
    volume: usize,
    value: usize,
    trading_status: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, ParseError> {
        let by_name: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_header(name), i))
            .collect();

        let find = |column: &str| {
            by_name
                .get(&normalize_header(column))
                .copied()
                .ok_or_else(|| ParseError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            symbol: find("Symbol")?,
            company_name: find("CompanyName")?,
            open: find("OpenPrice")?,
            high: find("HighPrice")?,
            low: find("LowPrice")?,
            average: find("AveragePrice")?,
            prev_average: find("PrevAveragePrice")?,
            close: find("ClosePrice")?,
            prev_close: find("PrevClosePrice")?,
            change: find("Change")?,
            change_percent: find("ChangePercent")?,
            num_trades: find("NumTrades")?,
            volume: find("Volume")?,
            value: find("Value")?,
            trading_status: find("TradingStatus").ok(),
        })
    }

    /// Decodes one record. `Ok(None)` means the row carries no symbol.
    fn entry(&self, record: &StringRecord, line: u64) -> Result<Option<ParsedEntry>, ParseError> {
        let field = |i: usize| record.get(i).unwrap_or("");

        let symbol = field(self.symbol);
        if symbol.is_empty() {
            return Ok(None);
        }

        let num_trades = integer(field(self.num_trades), line, "NumTrades")?;
        let trading_status = match self.trading_status {
            Some(i) => flag(field(i), line)?,
            None => num_trades > 0,
        };

        Ok(Some(ParsedEntry {
            symbol: symbol.to_string(),
            company_name: field(self.company_name).to_string(),
            open: decimal(field(self.open), line, "OpenPrice")?,
            high: decimal(field(self.high), line, "HighPrice")?,
            low: decimal(field(self.low), line, "LowPrice")?,
            average: decimal(field(self.average), line, "AveragePrice")?,
            prev_average: decimal(field(self.prev_average), line, "PrevAveragePrice")?,
            close: decimal(field(self.close), line, "ClosePrice")?,
            prev_close: decimal(field(self.prev_close), line, "PrevClosePrice")?,
            change: decimal(field(self.change), line, "Change")?,
            change_percent: decimal(field(self.change_percent), line, "ChangePercent")?,
            num_trades,
            volume: integer(field(self.volume), line, "Volume")?,
            value: decimal(field(self.value), line, "Value")?,
            trading_status,
        }))
    }
}

fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Reports leave numeric cells blank (or `-`) for symbols without activity.
fn is_blank(raw: &str) -> bool {
    raw.is_empty() || raw == "-"
}

fn decimal(raw: &str, line: u64, column: &'static str) -> Result<Decimal, ParseError> {
    if is_blank(raw) {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(raw).map_err(|_| ParseError::InvalidField {
        line,
        column,
        raw: raw.to_string(),
    })
}

fn integer(raw: &str, line: u64, column: &'static str) -> Result<u64, ParseError> {
    if is_blank(raw) {
        return Ok(0);
    }
    raw.parse::<u64>().map_err(|_| ParseError::InvalidField {
        line,
        column,
        raw: raw.to_string(),
    })
}

fn flag(raw: &str, line: u64) -> Result<bool, ParseError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ParseError::InvalidField {
            line,
            column: "TradingStatus",
            raw: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const HEADER: &str = "Symbol,Company Name,Open Price,High Price,Low Price,Average Price,\
Prev Average Price,Close Price,Prev Close Price,Change,Change Percent,Num Trades,Volume,Value";

    fn parse(text: &str) -> Result<Vec<ParsedEntry>, ParseError> {
        CsvReportParser::new().parse_reader(text.as_bytes())
    }

    #[test]
    fn rows_are_decoded_by_header_name() {
        let csv = format!("{HEADER}\nAPG1L,Apranga,2.1,2.2,2.05,2.13,2.09,2.18,2.08,0.1,4.81,41,12500,26625");
        let entries = parse(&csv).unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.symbol, "APG1L");
        assert_eq!(entry.company_name, "Apranga");
        assert_eq!(entry.close, dec!(2.18));
        assert_eq!(entry.change_percent, dec!(4.81));
        assert_eq!(entry.num_trades, 41);
        assert_eq!(entry.volume, 12_500);
        assert_eq!(entry.value, dec!(26625));
        assert!(entry.trading_status);
    }

    #[test]
    fn header_matching_ignores_case_and_punctuation() {
        let csv = "symbol,company_name,OPEN_PRICE,high price,LowPrice,average-price,prev average price,\
close price,prev close price,CHANGE,change %percent,num trades,volume,value,Trading Status\n\
TEL1L,Telia,1.5,1.55,1.49,1.52,1.51,1.54,1.5,0.04,2.67,12,3400,5168,true";
        let entries = parse(csv).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol, "TEL1L");
        assert_eq!(entries[0].high, dec!(1.55));
    }

    #[test]
    fn missing_column_fails_the_whole_report() {
        let csv = "Symbol,Company Name,Close Price\nAPG1L,Apranga,2.18";
        let err = parse(csv).unwrap_err();
        assert!(matches!(err, ParseError::MissingColumn(ref c) if c == "OpenPrice"));
    }

    #[test]
    fn blank_numbers_read_as_zero_and_status_follows_trades() {
        let csv = format!("{HEADER}\nKNF1L,Kauno energija,,,,,0.61,,0.61,,-,0,0,");
        let entries = parse(&csv).unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.open, Decimal::ZERO);
        assert_eq!(entry.prev_close, dec!(0.61));
        assert_eq!(entry.change_percent, Decimal::ZERO);
        assert_eq!(entry.num_trades, 0);
        assert!(!entry.trading_status);
    }

    #[test]
    fn malformed_row_is_skipped_and_the_rest_kept() {
        let csv = format!(
            "{HEADER}\n\
APG1L,Apranga,2.1,2.2,2.05,2.13,2.09,2.18,2.08,0.1,4.81,many,12500,26625\n\
TEL1L,Telia,1.5,1.55,1.49,1.52,1.51,1.54,1.5,0.04,2.67,12,3400,5168"
        );
        let entries = parse(&csv).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].symbol, "TEL1L");
    }

    #[test]
    fn rows_without_symbol_are_ignored() {
        let csv = format!("{HEADER}\n,Total,,,,,,,,,,,,\n");
        assert!(parse(&csv).unwrap().is_empty());
    }

    #[test]
    fn parse_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024 03 01.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "APG1L,Apranga,2.1,2.2,2.05,2.13,2.09,2.18,2.08,0.1,4.81,41,12500,26625").unwrap();
        drop(file);

        let entries = CsvReportParser::new().parse(&path).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");

        let err = CsvReportParser::new().parse(&path).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert!(err.to_string().contains("missing.csv"));
    }
}
