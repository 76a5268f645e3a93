// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (stderr, filtered by RUST_LOG, default "warn")
// 2. Parse command-line arguments and merge them with the config file
// 3. Load the targets and run the batch (Ctrl-C stops it early)
// 4. Print the report
// 5. Exit with a code scripts can act on:
//      0 = everything OK, 1 = warnings/failures, 2 = error, 130 = interrupted
// =============================================================================

mod checker;
mod cli;
mod config;
mod report;
mod targets;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use checker::Checker;
use cli::{CheckArgs, Cli, Commands};
use config::PartialConfig;
use report::{print_report, BatchReport, OutputFormat};

const EXIT_OK: i32 = 0;
const EXIT_PROBLEMS: i32 = 1;
const EXIT_ERROR: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => handle_check(args).await,
    }
}

// Handles the 'check' subcommand
async fn handle_check(args: CheckArgs) -> Result<i32> {
    let file_layer = match &args.config {
        Some(path) => PartialConfig::from_file(path)?,
        None => PartialConfig::default(),
    };
    let settings = file_layer.merge(args.overrides()).resolve()?;

    let entries = targets::load_targets(&args.input)?;
    if entries.is_empty() {
        bail!("no \"Full URL:\" entries found in {}", args.input.display());
    }
    info!(targets = entries.len(), input = %args.input.display(), "loaded targets");

    let checker = Checker::new(settings.engine)?;
    let batch = checker.run(entries, shutdown_signal()).await;
    let report = BatchReport::from(batch);

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    print_report(&report, format, settings.error_only)?;

    Ok(if report.interrupted {
        EXIT_INTERRUPTED
    } else if report.has_problems() {
        EXIT_PROBLEMS
    } else {
        EXIT_OK
    })
}

// Resolves when the operator presses Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler we just never interrupt
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    warn!("interrupt received, stopping after the checks already finished");
}
