use crate::error::LedgerError;
use crate::layout::OutputLayout;
use crate::reader::scan_coverage;
use chrono::NaiveDate;
use core_types::schema::{self, COLUMNS};
use core_types::{TradeEntry, ViewKind};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// The outcome of writing one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewReport {
    pub view: ViewKind,
    pub files: usize,
    pub failures: usize,
}

/// Stale daily files removed by a full rebuild, and those left behind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub failures: usize,
}

/// Writes the three projections of a reconciled set.
///
/// The combined view is all-or-nothing: any failure is returned. Daily and
/// ticker files are independent of each other, so a file that cannot be
/// written is logged, counted and skipped.
#[derive(Debug, Clone)]
pub struct Emitter<'a> {
    layout: &'a OutputLayout,
    parallel: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(layout: &'a OutputLayout, parallel: bool) -> Self {
        Self { layout, parallel }
    }

    /// Writes every entry, in the given order, to the combined file.
    /// An empty slice still produces a header-only file.
    pub fn write_combined(&self, entries: &[TradeEntry]) -> Result<ViewReport, LedgerError> {
        let dir = self.layout.view_dir(ViewKind::Combined);
        fs::create_dir_all(&dir).map_err(|e| LedgerError::io(&dir, e))?;

        write_rows(&self.layout.combined_path(), entries)?;
        Ok(ViewReport {
            view: ViewKind::Combined,
            files: 1,
            failures: 0,
        })
    }

    /// Writes one file per distinct date.
    pub fn write_daily(&self, entries: &[TradeEntry]) -> ViewReport {
        let mut groups: BTreeMap<NaiveDate, Vec<&TradeEntry>> = BTreeMap::new();
        for entry in entries {
            groups.entry(entry.date).or_default().push(entry);
        }
        let groups: Vec<_> = groups.into_iter().collect();

        self.write_view(ViewKind::Daily, &groups, |date| self.layout.daily_path(*date))
    }

    /// Writes one file per distinct symbol holding its whole history.
    pub fn write_ticker(&self, entries: &[TradeEntry]) -> ViewReport {
        let mut groups: BTreeMap<&str, Vec<&TradeEntry>> = BTreeMap::new();
        for entry in entries {
            groups.entry(entry.symbol.as_str()).or_default().push(entry);
        }

        // Two symbols must never share a file, so the names are resolved together.
        let names = self.layout.ticker_file_names(groups.keys().copied());
        let dir = self.layout.view_dir(ViewKind::Ticker);
        let mut unnamed = 0;
        let groups: Vec<(PathBuf, Vec<&TradeEntry>)> = groups
            .into_iter()
            .filter_map(|(symbol, rows)| match names.get(symbol) {
                Some(name) => Some((dir.join(name), rows)),
                None => {
                    tracing::warn!(symbol, "No distinct ticker file name for symbol, skipping it.");
                    unnamed += 1;
                    None
                }
            })
            .collect();

        let mut report = self.write_view(ViewKind::Ticker, &groups, |path| path.clone());
        report.failures += unnamed;
        report
    }

    /// Removes daily files for dates outside `keep`.
    ///
    /// A file that cannot be removed is logged and counted. Only a daily view
    /// that cannot be listed at all is returned as an error.
    pub fn prune_daily(&self, keep: &BTreeSet<NaiveDate>) -> Result<PruneReport, LedgerError> {
        let stale: Vec<NaiveDate> = scan_coverage(self.layout)?.difference(keep).copied().collect();

        let mut report = PruneReport::default();
        for date in stale {
            let path = self.layout.daily_path(date);
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Removed stale daily file.");
                    report.removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Could not remove stale daily file.");
                    report.failures += 1;
                }
            }
        }
        Ok(report)
    }

    fn write_view<K, F>(&self, view: ViewKind, groups: &[(K, Vec<&TradeEntry>)], path_of: F) -> ViewReport
    where
        K: Sync,
        F: Fn(&K) -> PathBuf + Sync,
    {
        let dir = self.layout.view_dir(view);
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(view = %view, dir = %dir.display(), error = %e, "Cannot create view directory, skipping every file.");
            return ViewReport {
                view,
                files: 0,
                failures: groups.len(),
            };
        }

        let write_one = |(key, rows): &(K, Vec<&TradeEntry>)| -> bool {
            let path = path_of(key);
            match write_rows(&path, rows.iter().copied()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(view = %view, error = %e, "Skipping view file that could not be written.");
                    false
                }
            }
        };

        let failures = if self.parallel {
            groups.par_iter().map(write_one).filter(|ok| !ok).count()
        } else {
            groups.iter().map(write_one).filter(|ok| !ok).count()
        };

        ViewReport {
            view,
            files: groups.len() - failures,
            failures,
        }
    }
}

/// Writes the header and one row per entry, replacing any existing file.
fn write_rows<'e>(path: &Path, entries: impl IntoIterator<Item = &'e TradeEntry>) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| LedgerError::csv(path, e))?;

    writer.write_record(COLUMNS).map_err(|e| LedgerError::csv(path, e))?;
    for entry in entries {
        writer
            .write_record(schema::to_record(entry))
            .map_err(|e| LedgerError::csv(path, e))?;
    }
    writer.flush().map_err(|e| LedgerError::io(path, e))
}
