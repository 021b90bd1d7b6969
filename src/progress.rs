use events::{PipelineEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// Renders run progress as a terminal progress bar over the pending reports.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self { bar })
    }
}

impl ProgressSink for BarSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::ManifestBuilt { discovered, pending } => {
                self.bar.set_length(*pending as u64);
                self.bar
                    .set_message(format!("{discovered} reports found, {pending} to process"));
            }
            PipelineEvent::FileStarted { file_name, .. } => {
                self.bar.set_message(format!("Parsing {file_name}..."));
            }
            PipelineEvent::FileIngested { .. } => self.bar.inc(1),
            PipelineEvent::FileSkipped { file_name, reason, .. } => {
                self.bar.println(format!("Skipped {file_name}: {reason}"));
                self.bar.inc(1);
            }
            PipelineEvent::Reconciled { .. } => self.bar.set_message("Writing views..."),
            PipelineEvent::ViewWritten { view, files, .. } => {
                self.bar.set_message(format!("Wrote {files} {view} file(s)"));
            }
            PipelineEvent::Completed(_) => self.bar.finish_with_message("Run complete!"),
        }
    }
}

/// Prints every event as one JSON line on stdout, for an enclosing orchestrator.
pub struct JsonLinesSink;

impl ProgressSink for JsonLinesSink {
    fn emit(&self, event: &PipelineEvent) {
        match event.to_json_line() {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
                    tracing::warn!(error = %e, "Could not write progress event.");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Could not serialize progress event."),
        }
    }
}
