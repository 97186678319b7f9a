//! End-to-end tests for the forecast page workflow
//!
//! Drive the Orchestrator with the real `TokioScheduler` on paused tokio time,
//! so the reference timings are asserted exactly without waiting for them.

use async_trait::async_trait;
use sfp_common::config::TomlConfig;
use sfp_common::events::{EventBus, ForecastEvent};
use sfp_forecast::error::{ExportError, ForecastError, RejectionReason};
use sfp_forecast::models::{ExportFormat, InputFile, MetricsBundle, RawFile, EXPORT_HEADER};
use sfp_forecast::services::{
    log_events, DirectorySink, DownloadSink, ForecastComputer, ImmediateScheduler, MemorySink,
    Orchestrator, Scheduler, SimulatedForecaster, TokioScheduler,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const GIB: u64 = 1024 * 1024 * 1024;

struct Harness {
    orchestrator: Orchestrator,
    sink: Arc<MemorySink>,
    event_bus: EventBus,
}

fn harness_with(scheduler: Arc<dyn Scheduler>, forecaster: Arc<dyn ForecastComputer>) -> Harness {
    let sink = Arc::new(MemorySink::new());
    let event_bus = EventBus::new(1024);
    let orchestrator = Orchestrator::from_config(
        &TomlConfig::default(),
        scheduler,
        forecaster,
        sink.clone(),
        event_bus.clone(),
    );
    Harness {
        orchestrator,
        sink,
        event_bus,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(TokioScheduler), Arc::new(SimulatedForecaster))
}

fn reference_files() -> Vec<RawFile> {
    vec![
        RawFile::from_name("sales_2023.parquet", GIB),
        RawFile::from_name("stores.parquet", 2 * GIB),
        RawFile::from_name("products.parquet", GIB / 2),
    ]
}

struct FailingForecaster;

#[async_trait]
impl ForecastComputer for FailingForecaster {
    async fn compute_forecast(&self, _files: &[InputFile]) -> Result<MetricsBundle, ForecastError> {
        Err(ForecastError::Computation("missing quantity column".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_reference_run_completes_and_exports() {
    let Harness {
        mut orchestrator,
        sink,
        ..
    } = harness();

    let start = Instant::now();
    let outcome = orchestrator.submit_batch(reference_files()).await.unwrap();
    // Three sequential transfers of 11 ticks x 100ms
    assert_eq!(start.elapsed(), Duration::from_millis(3300));
    assert!(outcome.rejected.is_empty());
    assert_eq!(outcome.committed.len(), 3);
    assert!(orchestrator.is_runner_active());

    let run_start = Instant::now();
    let state = orchestrator.wait_for_completion().await;
    // 6 stages of 1500ms plus training at 3000ms
    assert_eq!(run_start.elapsed(), Duration::from_millis(12_000));

    assert!(state.is_completed);
    assert!(!state.is_running);
    assert_eq!(state.progress_percent, 100);
    assert_eq!(state.current_stage_label, "Processing complete!");
    assert_eq!(state.status_label(), "Completed");
    let metrics = state.metrics.as_ref().unwrap();
    assert!(metrics.target_achieved());
    assert_eq!(metrics.cards()[3].value, "2m 34s");

    let receipt = orchestrator.request_export(ExportFormat::Csv).unwrap();
    assert_eq!(receipt.filename, "forecast_predictions.csv");

    let saved = sink.saved();
    let text = String::from_utf8(saved[0].1.clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0], EXPORT_HEADER);
    assert_eq!(lines[1], "1;1023;123;120");
    assert_eq!(lines[10], "5;1045;123;98");
}

#[tokio::test(start_paused = true)]
async fn test_oversized_file_never_activates() {
    let Harness {
        mut orchestrator, ..
    } = harness();

    let outcome = orchestrator
        .submit_batch(vec![RawFile::from_name("huge.parquet", 6 * GIB)])
        .await
        .unwrap();

    assert!(matches!(
        outcome.rejected.as_slice(),
        [RejectionReason::FileTooLarge { .. }]
    ));
    assert!(orchestrator.files().is_empty());
    assert!(!orchestrator.is_runner_active());
    assert!(orchestrator.run_state().is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_too_many_files_commits_nothing() {
    let Harness {
        mut orchestrator, ..
    } = harness();

    let mut batch = reference_files();
    batch.push(RawFile::from_name("extra.parquet", 1));

    let err = orchestrator.submit_batch(batch).await.unwrap_err();
    assert!(matches!(err, RejectionReason::TooManyFiles { current: 0, submitted: 4, max: 3 }));
    assert!(orchestrator.files().is_empty());
    assert!(!orchestrator.is_runner_active());
}

#[tokio::test(start_paused = true)]
async fn test_activation_waits_for_third_transfer() {
    let Harness {
        mut orchestrator, ..
    } = harness();
    let mut files = reference_files();
    let third = files.pop().unwrap();

    orchestrator.submit_batch(files).await.unwrap();
    assert!(!orchestrator.is_runner_active());
    assert!(orchestrator.run_state().is_idle());
    assert_eq!(
        orchestrator.pending_hint().as_deref(),
        Some("2/3 files uploaded. Upload all 3 files to start processing.")
    );

    let start = Instant::now();
    orchestrator.submit_batch(vec![third]).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(1100));
    assert!(orchestrator.is_runner_active());
    assert!(orchestrator.run_state().is_running);
    assert_eq!(orchestrator.pending_hint(), None);
}

#[tokio::test(start_paused = true)]
async fn test_export_rejected_while_running() {
    let Harness {
        mut orchestrator,
        sink,
        ..
    } = harness();
    orchestrator.submit_batch(reference_files()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(4000)).await;
    let state = orchestrator.run_state();
    assert!(state.is_running);
    assert!(state.progress_percent > 0 && state.progress_percent < 100);

    assert!(matches!(
        orchestrator.request_export(ExportFormat::Parquet),
        Err(ExportError::NotReady)
    ));
    assert!(sink.saved().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_removal_after_completion_resets_and_rerun_is_fresh() {
    let Harness {
        mut orchestrator, ..
    } = harness();
    orchestrator.submit_batch(reference_files()).await.unwrap();
    let first = orchestrator.wait_for_completion().await;
    assert!(first.is_completed);

    orchestrator.remove_file(1);
    assert_eq!(orchestrator.files().len(), 2);
    assert!(!orchestrator.is_runner_active());
    let state = orchestrator.run_state();
    assert!(state.is_idle());
    assert_eq!(state.progress_percent, 0);
    assert!(state.metrics.is_none());
    assert!(matches!(
        orchestrator.request_export(ExportFormat::Csv),
        Err(ExportError::NotReady)
    ));

    orchestrator
        .submit_batch(vec![RawFile::from_name("stores_v2.parquet", GIB)])
        .await
        .unwrap();
    let rerun = orchestrator.run_state();
    assert!(rerun.is_running);
    assert_eq!(rerun.progress_percent, 0);
    assert_ne!(rerun.run_id, first.run_id);
}

#[tokio::test(start_paused = true)]
async fn test_removal_mid_run_stops_progress() {
    let Harness {
        mut orchestrator, ..
    } = harness();
    orchestrator.submit_batch(reference_files()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert!(orchestrator.run_state().progress_percent > 0);

    orchestrator.remove_file(0);
    assert!(orchestrator.run_state().is_idle());

    // The abandoned run must not write again
    tokio::time::sleep(Duration::from_secs(20)).await;
    let state = orchestrator.run_state();
    assert!(state.is_idle());
    assert_eq!(state.progress_percent, 0);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_removal_is_noop() {
    let Harness {
        mut orchestrator, ..
    } = harness();
    orchestrator.submit_batch(reference_files()).await.unwrap();

    orchestrator.remove_file(7);
    assert_eq!(orchestrator.files().len(), 3);
    assert!(orchestrator.is_runner_active());
    assert!(orchestrator.run_state().is_running);
}

#[tokio::test]
async fn test_forecast_failure_ends_failed_until_removal() {
    let Harness {
        mut orchestrator, ..
    } = harness_with(Arc::new(ImmediateScheduler), Arc::new(FailingForecaster));
    orchestrator.submit_batch(reference_files()).await.unwrap();

    let state = orchestrator.wait_for_completion().await;
    assert!(state.is_failed());
    assert!(!state.is_running);
    assert!(!state.is_completed);
    assert_eq!(state.status_label(), "Failed");
    assert!(state.failure.as_deref().unwrap().contains("missing quantity column"));
    assert!(matches!(
        orchestrator.request_export(ExportFormat::Csv),
        Err(ExportError::NotReady)
    ));

    orchestrator.remove_file(2);
    assert!(orchestrator.run_state().is_idle());
}

#[tokio::test]
async fn test_notifications_and_run_events() {
    let Harness {
        mut orchestrator,
        event_bus,
        ..
    } = harness_with(Arc::new(ImmediateScheduler), Arc::new(SimulatedForecaster));
    let mut rx = event_bus.subscribe();

    orchestrator.submit_batch(reference_files()).await.unwrap();
    orchestrator.wait_for_completion().await;
    orchestrator.request_export(ExportFormat::Parquet).unwrap();

    let mut titles = Vec::new();
    let mut stage_targets = Vec::new();
    let mut completed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            ForecastEvent::Notification { notification, .. } => titles.push(notification.title),
            ForecastEvent::StageStarted { target_percent, .. } => {
                stage_targets.push(target_percent)
            }
            ForecastEvent::RunCompleted { total_predictions, .. } => {
                assert_eq!(total_predictions, 45_820);
                completed += 1;
            }
            _ => {}
        }
    }

    assert_eq!(
        titles,
        vec![
            "Files uploaded successfully!".to_string(),
            "Download started - PARQUET".to_string()
        ]
    );
    assert_eq!(stage_targets, vec![14, 28, 42, 57, 71, 85, 100]);
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn test_directory_export_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink: Arc<dyn DownloadSink> = Arc::new(DirectorySink::new(dir.path()));
    let mut orchestrator = Orchestrator::from_config(
        &TomlConfig::default(),
        Arc::new(ImmediateScheduler),
        Arc::new(SimulatedForecaster),
        sink,
        EventBus::new(1024),
    );

    orchestrator.submit_batch(reference_files()).await.unwrap();
    orchestrator.wait_for_completion().await;
    let receipt = orchestrator.request_export(ExportFormat::Parquet).unwrap();

    let path = dir.path().join("forecast_predictions.parquet");
    assert_eq!(receipt.location, path.display().to_string());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("week;store;product;quantity\n1;1023;123;120"));
}

#[tokio::test]
async fn test_event_log_keeps_every_notification_at_shutdown() {
    let event_bus = EventBus::new(1024);
    let logger = tokio::spawn(log_events(event_bus.subscribe()));
    let mut orchestrator = Orchestrator::from_config(
        &TomlConfig::default(),
        Arc::new(ImmediateScheduler),
        Arc::new(SimulatedForecaster),
        Arc::new(MemorySink::new()),
        event_bus,
    );

    orchestrator.submit_batch(reference_files()).await.unwrap();
    orchestrator.wait_for_completion().await;
    orchestrator.request_export(ExportFormat::Csv).unwrap();
    orchestrator.request_export(ExportFormat::Parquet).unwrap();

    // Releases the last bus sender; the logger drains what is queued and exits
    drop(orchestrator);
    let summary = logger.await.unwrap();

    assert_eq!(summary.notifications, 3);
    assert_eq!(summary.lagged, 0);
    // 33 upload ticks, 1 file set, 7 stages, 100 run ticks, 1 completion, 3 notifications
    assert_eq!(summary.events, 145);
}
