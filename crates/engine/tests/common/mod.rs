//! Fixtures shared by the pipeline scenarios.

#![allow(dead_code)]

use configuration::Config;
use core_types::TradeEntry;
use engine::{CancelFlag, Pipeline};
use events::{CollectingSink, RunSummary};
use ledger::load_history;
use report_parser::CsvReportParser;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const REPORT_HEADER: &str = "Symbol,Company Name,Open Price,High Price,Low Price,Average Price,\
Prev Average Price,Close Price,Prev Close Price,Change,Change Percent,Num Trades,Volume,Value";

/// An input and an output directory that live as long as the workspace.
pub struct Workspace {
    _root: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("reports");
        let output = root.path().join("output");
        fs::create_dir_all(&input).unwrap();
        Self {
            _root: root,
            input,
            output,
        }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.paths.input_dir = self.input.clone();
        config.paths.output_dir = self.output.clone();
        config
    }

    /// Writes a report for 2024-03-`day` holding one row per `(symbol, close)`.
    pub fn report(&self, day: u32, rows: &[(&str, &str)]) -> PathBuf {
        let mut contents = format!("{REPORT_HEADER}\n");
        for (symbol, close) in rows {
            contents.push_str(&format!(
                "{symbol},{symbol} AB,{close},{close},{close},{close},{close},{close},{close},0.05,1.25,4,100,{close}\n"
            ));
        }
        let path = self.input.join(format!("2024 03 {day:02}.csv"));
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn run(&self, config: Config) -> (RunSummary, CollectingSink) {
        let sink = CollectingSink::new();
        let summary = Pipeline::new(config, Arc::new(CsvReportParser::new()))
            .run(&sink, &CancelFlag::new())
            .unwrap();
        (summary, sink)
    }

    pub fn run_default(&self) -> RunSummary {
        self.run(self.config()).0
    }

    pub fn combined_path(&self) -> PathBuf {
        self.output.join("combined").join("all_trades.csv")
    }

    pub fn daily_path(&self, day: u32) -> PathBuf {
        self.output.join("daily").join(format!("2024-03-{day:02}.csv"))
    }

    pub fn ticker_path(&self, symbol: &str) -> PathBuf {
        self.output.join("ticker").join(format!("{symbol}_history.csv"))
    }

    /// The combined view keyed by `(date, symbol)`.
    pub fn combined(&self) -> BTreeMap<(chrono::NaiveDate, String), TradeEntry> {
        load_history(&self.combined_path(), configuration::MalformedFieldPolicy::RejectRow)
            .unwrap()
            .entries
            .into_iter()
            .map(|entry| (entry.key(), entry))
            .collect()
    }

    /// Contents of every file below the output root, keyed by relative path.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        let mut files = BTreeMap::new();
        collect(&self.output, &self.output, &mut files);
        files
    }
}

fn collect(root: &Path, dir: &Path, files: &mut BTreeMap<PathBuf, String>) {
    for item in fs::read_dir(dir).unwrap() {
        let path = item.unwrap().path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let relative = path.strip_prefix(root).unwrap().to_path_buf();
            files.insert(relative, fs::read_to_string(&path).unwrap());
        }
    }
}

pub fn day(d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}
