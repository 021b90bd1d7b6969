use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configuration::{init_logging, load_config, Config, DuplicatePolicy, MalformedFieldPolicy};
use engine::{CancelFlag, Pipeline};
use events::ProgressSink;
use report_parser::CsvReportParser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod progress;
mod summary;

use progress::{BarSink, JsonLinesSink};

/// The main entry point for the Marketbook application.
fn main() -> ExitCode {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // The guard flushes the log file on drop, so it lives until main returns.
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Run(args) => handle_run(config, args.json_progress),
        Commands::Status(_) => handle_status(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Rebuilds a forward-filled market ledger from dated daily report files.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to `config.toml` in the working directory, if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest new reports and rewrite the combined, daily and ticker views.
    Run(RunArgs),
    /// Show what a run would process, without writing anything.
    Status(PathArgs),
}

#[derive(Args)]
struct PathArgs {
    /// Directory holding the dated report files.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Root directory of the emitted views.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    paths: PathArgs,

    /// Reprocess every report and discard all history.
    #[arg(long)]
    force_full: bool,

    /// Print one JSON line per progress event instead of a progress bar.
    #[arg(long)]
    json_progress: bool,

    /// How to treat two entries for the same symbol and date.
    #[arg(long, value_enum)]
    duplicate_entries: Option<DuplicatePolicy>,

    /// How to treat two report files for the same date.
    #[arg(long, value_enum)]
    duplicate_source_dates: Option<DuplicatePolicy>,

    /// How to treat unparsable fields in the previous combined view.
    #[arg(long, value_enum)]
    malformed_fields: Option<MalformedFieldPolicy>,

    /// Write the daily and ticker views on a single thread.
    #[arg(long)]
    sequential: bool,
}

/// Loads the configuration and applies command-line overrides on top.
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    let paths = match &cli.command {
        Commands::Run(args) => &args.paths,
        Commands::Status(paths) => paths,
    };
    if let Some(input) = &paths.input {
        config.paths.input_dir = input.clone();
    }
    if let Some(output) = &paths.output {
        config.paths.output_dir = output.clone();
    }

    if let Commands::Run(args) = &cli.command {
        let reconcile = &mut config.reconcile;
        reconcile.force_full |= args.force_full;
        reconcile.parallel_emit &= !args.sequential;
        if let Some(policy) = args.duplicate_entries {
            reconcile.duplicate_entries = policy;
        }
        if let Some(policy) = args.duplicate_source_dates {
            reconcile.duplicate_source_dates = policy;
        }
        if let Some(policy) = args.malformed_fields {
            reconcile.malformed_fields = policy;
        }
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_run(config: Config, json_progress: bool) -> anyhow::Result<()> {
    tracing::info!(
        input = %config.paths.input_dir.display(),
        output = %config.paths.output_dir.display(),
        "Starting run."
    );

    let pipeline = Pipeline::new(config, Arc::new(CsvReportParser::new()));
    let cancel = CancelFlag::new();

    let sink: Box<dyn ProgressSink> = if json_progress {
        Box::new(JsonLinesSink)
    } else {
        Box::new(BarSink::new()?)
    };

    let summary = pipeline.run(&*sink, &cancel).context("Run failed")?;

    // The JSON stream already ends with the summary.
    if !json_progress {
        println!("{}", summary::summary_table(&summary));
        if summary.is_noop() {
            println!("No new reports to process.");
        }
    }
    Ok(())
}

fn handle_status(config: Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config, Arc::new(CsvReportParser::new()));
    let plan = pipeline.plan().context("Failed to plan the run")?;

    println!("{}", summary::plan_table(&plan));
    if plan.diff.pending.is_empty() {
        println!("Up to date.");
    } else {
        println!("Pending reports:");
        for file in &plan.diff.pending {
            println!("  {}  {}", file.date, file.file_name);
        }
    }
    Ok(())
}
