use crate::cancel::{CancelFlag, Phase};
use crate::error::EngineError;
use core_types::{SourceFileRef, TradeEntry};
use events::{PipelineEvent, ProgressSink};
use report_parser::ReportParser;

/// Entries stamped from the parsed source files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub entries: Vec<TradeEntry>,
    pub processed: usize,
    pub failures: usize,
}

/// Parses each pending file and stamps its entries with the file's date.
///
/// A file the parser rejects is logged, reported as skipped and left out; the
/// remaining files are still ingested.
pub fn ingest(
    parser: &dyn ReportParser,
    files: &[SourceFileRef],
    sink: &dyn ProgressSink,
    cancel: &CancelFlag,
) -> Result<Ingested, EngineError> {
    let total = files.len();
    let mut ingested = Ingested::default();

    for (i, file) in files.iter().enumerate() {
        cancel.check(Phase::Ingest)?;
        let index = i + 1;

        sink.emit(&PipelineEvent::FileStarted {
            index,
            total,
            file_name: file.file_name.clone(),
            date: file.date,
        });

        match parser.parse(&file.path) {
            Ok(parsed) => {
                let entries = parsed.len();
                ingested.entries.extend(parsed.into_iter().map(|entry| entry.on(file.date)));
                ingested.processed += 1;

                tracing::debug!(file = %file.file_name, date = %file.date, entries, "Ingested source file.");
                sink.emit(&PipelineEvent::FileIngested {
                    index,
                    total,
                    file_name: file.file_name.clone(),
                    entries,
                });
            }
            Err(e) => {
                ingested.failures += 1;

                tracing::warn!(file = %file.file_name, parser = parser.name(), error = %e, "Skipping source file that failed to parse.");
                sink.emit(&PipelineEvent::FileSkipped {
                    index,
                    total,
                    file_name: file.file_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::ParsedEntry;
    use events::CollectingSink;
    use report_parser::ParseError;
    use rust_decimal::Decimal;
    use std::path::{Path, PathBuf};

    /// Returns one entry per file, except for files named `bad`.
    struct StubParser;

    impl ReportParser for StubParser {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn parse(&self, path: &Path) -> Result<Vec<ParsedEntry>, ParseError> {
            if path.ends_with("bad") {
                return Err(ParseError::MissingColumn("Symbol".to_string()));
            }
            Ok(vec![ParsedEntry {
                symbol: "APG1L".to_string(),
                company_name: "Apranga".to_string(),
                open: Decimal::ONE,
                high: Decimal::ONE,
                low: Decimal::ONE,
                average: Decimal::ONE,
                prev_average: Decimal::ONE,
                close: Decimal::ONE,
                prev_close: Decimal::ONE,
                change: Decimal::ZERO,
                change_percent: Decimal::ZERO,
                num_trades: 1,
                volume: 10,
                value: Decimal::TEN,
                trading_status: true,
            }])
        }
    }

    fn source(d: u32, name: &str) -> SourceFileRef {
        SourceFileRef {
            date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            file_name: name.to_string(),
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn entries_are_stamped_with_the_file_date() {
        let files = vec![source(1, "a"), source(2, "b")];
        let result = ingest(&StubParser, &files, &CollectingSink::new(), &CancelFlag::new()).unwrap();

        assert_eq!(result.processed, 2);
        let dates: Vec<_> = result.entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![files[0].date, files[1].date]);
    }

    #[test]
    fn parse_failures_are_skipped_and_reported() {
        let files = vec![source(1, "a"), source(2, "bad"), source(3, "c")];
        let sink = CollectingSink::new();

        let result = ingest(&StubParser, &files, &sink, &CancelFlag::new()).unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(result.failures, 1);
        let skipped: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::FileSkipped { index, file_name, .. } => Some((index, file_name)),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec![(2, "bad".to_string())]);
    }

    #[test]
    fn cancellation_stops_before_the_next_file() {
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = ingest(&StubParser, &[source(1, "a")], &CollectingSink::new(), &cancel);
        assert!(matches!(result, Err(EngineError::Cancelled(Phase::Ingest))));
    }
}
