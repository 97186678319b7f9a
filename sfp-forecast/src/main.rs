//! sfp-forecast - Sales forecast processing host
//!
//! Submits the given files as one upload batch, follows the staged run to its
//! terminal state, prints the metric cards and writes any requested exports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sfp_common::config::{load_config, TomlConfig};
use sfp_common::events::EventBus;
use sfp_common::human_format::format_file_size;
use sfp_forecast::logging;
use sfp_forecast::models::{ExportFormat, RawFile, RunState};
use sfp_forecast::services::{
    log_events, DirectorySink, ImmediateScheduler, Orchestrator, Scheduler, SimulatedForecaster,
    TokioScheduler,
};
use tracing::{debug, info};

/// Command-line arguments for sfp-forecast
#[derive(Parser, Debug)]
#[command(name = "sfp-forecast")]
#[command(about = "Sales forecast processing pipeline")]
#[command(version)]
struct Args {
    /// Input files (submitted as a single batch)
    files: Vec<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export format to write after completion (repeatable)
    #[arg(short, long = "export", value_name = "FORMAT")]
    exports: Vec<ExportFormat>,

    /// Directory for exported files (overrides [export] output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip simulated delays
    #[arg(long)]
    instant: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Subscriber first: config resolution logs its own warnings
    let log_filter = logging::init().context("Failed to initialize logging")?;

    let (config, source) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if log_filter
        .apply_config_level(&config.logging.level)
        .context("Failed to apply configured log level")?
    {
        debug!(level = %config.logging.level, "Configured log level applied");
    }

    info!(
        "Starting sfp-forecast {} ({}, {} build)",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );
    info!(?source, built = env!("BUILD_TIMESTAMP"), "Configuration resolved");

    let event_bus = EventBus::new(1024);
    let event_logger = tokio::spawn(log_events(event_bus.subscribe()));

    let scheduler: Arc<dyn Scheduler> = if args.instant {
        Arc::new(ImmediateScheduler)
    } else {
        Arc::new(TokioScheduler)
    };
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.export.output_dir.clone());

    let mut orchestrator = Orchestrator::from_config(
        &config,
        scheduler,
        Arc::new(SimulatedForecaster),
        Arc::new(DirectorySink::new(&output_dir)),
        event_bus,
    );

    let result = run(&args, &config, &mut orchestrator).await;

    // Last bus sender goes with the orchestrator; the logger drains and exits
    drop(orchestrator);
    let summary = event_logger.await.context("Event logger task failed")?;
    debug!(
        events = summary.events,
        notifications = summary.notifications,
        lagged = summary.lagged,
        "Event log closed"
    );

    result
}

/// Submit the files, follow the run and write the requested exports
async fn run(args: &Args, config: &TomlConfig, orchestrator: &mut Orchestrator) -> Result<()> {
    let candidates = args
        .files
        .iter()
        .map(|path| {
            RawFile::from_path(path).with_context(|| format!("Cannot read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    if candidates.is_empty() {
        println!(
            "No files given. Upload {} {} files to start processing.",
            config.acceptance.max_files,
            config.acceptance.accepted_types.join("/")
        );
        return Ok(());
    }

    let outcome = match orchestrator.submit_batch(candidates).await {
        Ok(outcome) => outcome,
        Err(reason) => {
            println!("Batch refused: {}", reason);
            return Ok(());
        }
    };

    for reason in &outcome.rejected {
        println!("Rejected: {}", reason);
    }
    for file in orchestrator.files() {
        println!("Uploaded {} ({})", file.name(), format_file_size(file.size_bytes()));
    }

    if !orchestrator.is_runner_active() {
        if let Some(hint) = orchestrator.pending_hint() {
            println!("{}", hint);
        }
        return Ok(());
    }

    let progress = tokio::spawn(render_progress(orchestrator.subscribe_run_state()));
    let state = orchestrator.wait_for_completion().await;
    progress.abort();

    if let Some(diagnostic) = &state.failure {
        anyhow::bail!("Processing failed: {}", diagnostic);
    }

    if let Some(metrics) = &state.metrics {
        println!("\n{}", state.status_label());
        for card in metrics.cards() {
            let trend = card.trend.map(|t| format!(" ({})", t.display())).unwrap_or_default();
            println!("  {:<18} {:>10}  {}{}", card.title, card.value, card.description, trend);
        }
        if metrics.target_achieved() {
            println!("  Target achieved");
        }
    }

    for format in &args.exports {
        let receipt = orchestrator
            .request_export(*format)
            .with_context(|| format!("Export {} failed", format))?;
        println!("Saved {} ({} bytes)", receipt.location, receipt.bytes);
    }

    Ok(())
}

/// Print a line per stage and per ten percent of progress
async fn render_progress(mut rx: tokio::sync::watch::Receiver<RunState>) {
    let mut last_label = String::new();
    let mut last_decile = None;
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        let decile = state.progress_percent / 10;
        if state.current_stage_label != last_label || Some(decile) != last_decile {
            println!("[{:>3}%] {}", state.progress_percent, state.current_stage_label);
            last_label = state.current_stage_label.clone();
            last_decile = Some(decile);
        }
        if state.is_terminal() {
            break;
        }
    }
}
