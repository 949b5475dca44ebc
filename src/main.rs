//! nfcfix - Rename files and directories to composed (NFC) Unicode names.
//!
//! Usage:
//!   nfcfix [DIRECTORY]              Rename decomposed names in place
//!   nfcfix -n [DIRECTORY]           Show what would be renamed
//!   nfcfix --backup [DIRECTORY]     Also write a backup ledger
//!   nfcfix --stats-only [DIRECTORY] Only report statistics
//!   nfcfix --help                   Show help

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use nfcfix_core::{NormalizeConfig, RunStats};
use nfcfix_ops::{ExecuteOptions, ExecutionReport, OutcomeStatus, RenameExecutor};
use nfcfix_scan::{Collection, Collector};

#[derive(Parser)]
#[command(
    name = "nfcfix",
    version,
    about = "Rename files and directories to composed (NFC) Unicode names",
    long_about = "nfcfix finds file and directory names stored in decomposed (NFD) \
                  form, as written by macOS, and renames them to the composed (NFC) \
                  form. Existing files are never overwritten unless --force is given."
)]
struct Cli {
    /// Directory to process (defaults to current directory)
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Show what would be renamed without changing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Only consider names that contain non-ASCII characters
    #[arg(long)]
    all_files: bool,

    /// Write a backup ledger of every rename into the directory
    #[arg(long)]
    backup: bool,

    /// Overwrite existing files instead of picking a `_nfcN` name
    #[arg(long)]
    force: bool,

    /// Only print the summary
    #[arg(short, long)]
    quiet: bool,

    /// Only collect and print statistics
    #[arg(long)]
    stats_only: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

impl Cli {
    fn config(&self) -> Result<NormalizeConfig> {
        NormalizeConfig::builder()
            .root(&self.directory)
            .dry_run(self.dry_run)
            .all_files(self.all_files)
            .backup(self.backup)
            .force(self.force)
            .quiet(self.quiet)
            .stats_only(self.stats_only)
            .build()
            .context("Invalid options")
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything one invocation produced.
#[derive(Debug, Serialize)]
struct RunReport {
    config: NormalizeConfig,
    collection: Collection,
    execution: Option<ExecutionReport>,
    stats: RunStats,
    ledger: Option<PathBuf>,
    ledger_error: Option<String>,
}

impl RunReport {
    fn is_success(&self) -> bool {
        !self.collection.interrupted
            && self.ledger_error.is_none()
            && self.execution.as_ref().is_none_or(ExecutionReport::is_success)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logger(cli.quiet);

    let config = cli.config()?;
    let format = cli.format;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current item");
            token.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || run(config, format, cancel))
        .await
        .context("Worker task failed")??;

    match format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{json}");
        }
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Collect, execute and write the ledger.
fn run(
    config: NormalizeConfig,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<RunReport> {
    let text = matches!(format, OutputFormat::Text);

    if text {
        if config.stats_only {
            eprintln!("STATS ONLY MODE - collecting statistics");
        } else if config.dry_run {
            eprintln!("DRY RUN MODE - no changes will be made");
        }
        eprintln!("Scanning {}...", config.root.display());
    }

    let collection = Collector::new()
        .with_cancellation(cancel.clone())
        .collect(&config)
        .context("Scan failed")?;

    let mut stats = collection.stats.clone();
    let mut report = RunReport {
        config,
        collection,
        execution: None,
        stats: RunStats::new(),
        ledger: None,
        ledger_error: None,
    };

    if report.config.stats_only
        || report.collection.interrupted
        || report.collection.plan.is_empty()
    {
        report.stats = stats;
        return Ok(report);
    }

    let execution = RenameExecutor::new(ExecuteOptions::from(&report.config))
        .with_cancellation(cancel)
        .execute(&report.collection.plan);
    stats.merge(&execution.stats);

    if report.config.backup && !execution.ledger.is_empty() {
        match execution.ledger.finalize(&report.collection.root, &stats) {
            Ok(path) => report.ledger = path,
            Err(e) => {
                warn!("{e}");
                report.ledger_error = Some(e.to_string());
            }
        }
    }

    report.stats = stats;
    report.execution = Some(execution);
    Ok(report)
}

fn print_report(report: &RunReport) {
    let stats = &report.stats;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", report.collection.root.display());
    println!("{}", "─".repeat(60));
    println!(" Files scanned:        {}", stats.files_scanned);
    println!(" Directories scanned:  {}", stats.dirs_scanned);
    println!(" Non-ASCII files:      {}", stats.non_ascii_files);
    println!(" Non-ASCII dirs:       {}", stats.non_ascii_dirs);
    println!(" Need normalization:   {}", stats.needs_normalization);
    if stats.warnings > 0 {
        println!(" Skipped (warnings):   {}", stats.warnings);
    }
    println!(" Scanned in {:.2}s", report.collection.duration.as_secs_f64());

    if !stats.by_script.is_empty() {
        println!();
        println!(" Scripts:");
        for (label, count) in stats
            .by_script
            .iter()
            .map(|(script, count)| (script.to_string(), count))
            .sorted()
        {
            println!("   {label:<16} {count}");
        }
    }

    println!();
    if report.collection.interrupted {
        println!(" Scan interrupted, nothing was renamed.");
        return;
    }
    if report.collection.plan.is_empty() {
        println!(" All filenames are already properly normalized!");
        return;
    }

    let Some(execution) = &report.execution else {
        return;
    };

    if report.config.is_dry_run() {
        println!(
            " Would rename:         {}",
            execution.with_status(OutcomeStatus::Planned).count()
        );
        println!(" Would disambiguate:   {}", stats.skipped_exists);
    } else {
        println!(" Renamed:              {}", stats.renamed_success);
        println!(" Failed:               {}", stats.renamed_failed);
        println!(" Disambiguated:        {}", stats.skipped_exists);
    }

    if !execution.failures.is_empty() {
        println!();
        for failure in &execution.failures {
            println!("   {failure}");
        }
    }

    if execution.interrupted {
        println!();
        println!(" Interrupted before all entries were processed.");
    }

    if let Some(path) = &report.ledger {
        println!();
        println!(" Backup ledger: {}", path.display());
    }
    if let Some(error) = &report.ledger_error {
        println!();
        println!(" Backup ledger was NOT written: {error}");
    }
}
