use crate::cancel::{CancelFlag, Phase};
use crate::diff::{plan_incremental, IncrementalPlan};
use crate::error::EngineError;
use crate::ingest::ingest;
use crate::manifest::ManifestBuilder;
use crate::reconciler::Reconciler;
use chrono::NaiveDate;
use configuration::Config;
use core_types::SourceFileRef;
use events::{PipelineEvent, ProgressSink, RunSummary};
use ledger::{load_history, scan_coverage, Emitter, OutputLayout, ViewReport};
use report_parser::ReportParser;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Everything known about a run before any source file is parsed.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub manifest: Vec<SourceFileRef>,
    pub covered: BTreeSet<NaiveDate>,
    pub historical_loaded: usize,
    pub malformed_rows: usize,
    pub diff: IncrementalPlan,
}

/// Drives one reconciliation run: manifest, diff, ingest, reconcile, emit.
pub struct Pipeline {
    config: Config,
    parser: Arc<dyn ReportParser>,
    layout: OutputLayout,
}

impl Pipeline {
    pub fn new(config: Config, parser: Arc<dyn ReportParser>) -> Self {
        let layout = OutputLayout::new(&config.paths.output_dir, &config.naming);
        Self { config, parser, layout }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Works out what a run would do without writing anything.
    pub fn plan(&self) -> Result<RunPlan, EngineError> {
        self.prepare(&CancelFlag::new())
    }

    /// Runs the whole pipeline.
    ///
    /// Per-file problems (unparsable reports, malformed history rows, daily or
    /// ticker files that cannot be written) are counted in the summary. Only
    /// the conditions that make the output untrustworthy are returned as errors.
    pub fn run(&self, sink: &dyn ProgressSink, cancel: &CancelFlag) -> Result<RunSummary, EngineError> {
        let root = self.layout.root();
        std::fs::create_dir_all(root).map_err(|source| EngineError::OutputRoot {
            path: root.to_path_buf(),
            source,
        })?;

        let plan = self.prepare(cancel)?;
        sink.emit(&PipelineEvent::ManifestBuilt {
            discovered: plan.manifest.len(),
            pending: plan.diff.pending.len(),
        });
        tracing::info!(
            discovered = plan.manifest.len(),
            covered = plan.covered.len(),
            pending = plan.diff.pending.len(),
            force_full = self.config.reconcile.force_full,
            "Run planned."
        );

        cancel.check(Phase::Ingest)?;
        let ingested = ingest(self.parser.as_ref(), &plan.diff.pending, sink, cancel)?;

        cancel.check(Phase::Reconcile)?;
        let records = plan.diff.retained.into_iter().chain(ingested.entries);
        let reconciled = Reconciler::new(self.config.reconcile.duplicate_entries).reconcile(records)?;
        sink.emit(&PipelineEvent::Reconciled {
            dates: reconciled.dates,
            symbols: reconciled.symbols,
            real: reconciled.real,
            synthesized: reconciled.synthesized,
        });

        cancel.check(Phase::Emit)?;
        let emitter = Emitter::new(&self.layout, self.config.reconcile.parallel_emit);
        let combined = emitter.write_combined(&reconciled.entries)?;
        report_view(sink, combined);
        let daily = emitter.write_daily(&reconciled.entries);
        report_view(sink, daily);
        // Stale daily files would otherwise count as coverage on the next run.
        let mut prune_failures = 0;
        if self.config.reconcile.force_full {
            let dates: BTreeSet<NaiveDate> = reconciled.entries.iter().map(|e| e.date).collect();
            prune_failures = match emitter.prune_daily(&dates) {
                Ok(pruned) => pruned.failures,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not prune stale daily files.");
                    1
                }
            };
        }
        let ticker = emitter.write_ticker(&reconciled.entries);
        report_view(sink, ticker);

        let summary = RunSummary {
            discovered: plan.manifest.len(),
            processed: ingested.processed,
            parse_failures: ingested.failures,
            historical_loaded: plan.historical_loaded,
            historical_purged: plan.diff.purged,
            malformed_rows: plan.malformed_rows,
            duplicates_replaced: reconciled.duplicates_replaced,
            real_entries: reconciled.real,
            synthesized_entries: reconciled.synthesized,
            dates: reconciled.dates,
            symbols: reconciled.symbols,
            daily_files: daily.files,
            ticker_files: ticker.files,
            write_failures: daily.failures + ticker.failures + prune_failures,
        };

        tracing::info!(
            processed = summary.processed,
            parse_failures = summary.parse_failures,
            entries = reconciled.entries.len(),
            write_failures = summary.write_failures,
            "Run complete."
        );
        sink.emit(&PipelineEvent::Completed(summary.clone()));
        Ok(summary)
    }

    fn prepare(&self, cancel: &CancelFlag) -> Result<RunPlan, EngineError> {
        cancel.check(Phase::Manifest)?;
        let manifest = ManifestBuilder::new(&self.config.naming, self.config.reconcile.duplicate_source_dates)?
            .build(&self.config.paths.input_dir)?;

        cancel.check(Phase::Diff)?;
        let covered = scan_coverage(&self.layout)?;
        let history = load_history(&self.layout.combined_path(), self.config.reconcile.malformed_fields)?;
        let historical_loaded = history.entries.len();
        let diff = plan_incremental(&manifest, &covered, history.entries, self.config.reconcile.force_full);

        Ok(RunPlan {
            manifest,
            covered,
            historical_loaded,
            malformed_rows: history.malformed_rows,
            diff,
        })
    }
}

fn report_view(sink: &dyn ProgressSink, report: ViewReport) {
    sink.emit(&PipelineEvent::ViewWritten {
        view: report.view,
        files: report.files,
        failures: report.failures,
    });
}
