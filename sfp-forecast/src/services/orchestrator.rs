//! Forecast orchestrator
//!
//! Page-level controller wiring the Upload Manager to the Stage Runner:
//! - holds the authoritative committed file sequence
//! - activates the Stage Runner when the sequence reaches exactly the
//!   required count, and notifies the user once
//! - deactivates and resets the runner when the sequence drops below it
//! - serves exports once the run has completed
//!
//! # Policies
//! - Exports before completion are rejected with `ExportError::NotReady`.
//! - Reaching the required count again after a removal starts a fresh run;
//!   the previous result is discarded at the moment of the removal.

use super::{
    BatchOutcome, DownloadSink, ForecastComputer, RunOutcome, Scheduler, StageRunner,
    UploadManager,
};
use crate::error::{ExportError, UploadResult};
use crate::models::{default_stages, ExportFormat, ExportPayload, InputFile, RawFile, RunState};
use sfp_common::config::TomlConfig;
use sfp_common::events::{EventBus, ForecastEvent, Notification};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Handle on the run currently owned by the orchestrator
struct ActiveRun {
    run_id: Uuid,
    cancel: CancellationToken,
    /// Taken once the outcome has been awaited
    task: Option<JoinHandle<RunOutcome>>,
}

/// Receipt for a completed export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub format: ExportFormat,
    pub filename: String,
    /// Where the save collaborator put the payload
    pub location: String,
    pub bytes: usize,
}

/// Forecast orchestrator service
pub struct Orchestrator {
    uploads: UploadManager,
    runner: StageRunner,
    files: Vec<InputFile>,
    required_file_count: usize,
    active_run: Option<ActiveRun>,
    sink: Arc<dyn DownloadSink>,
    event_bus: EventBus,
}

impl Orchestrator {
    /// Create an orchestrator with explicit collaborators
    pub fn new(
        uploads: UploadManager,
        runner: StageRunner,
        sink: Arc<dyn DownloadSink>,
        event_bus: EventBus,
    ) -> Self {
        let required_file_count = uploads.policy().max_files;
        Self {
            uploads,
            runner,
            files: Vec::new(),
            required_file_count,
            active_run: None,
            sink,
            event_bus,
        }
    }

    /// Create an orchestrator from configuration with the reference stage table
    pub fn from_config(
        config: &TomlConfig,
        scheduler: Arc<dyn Scheduler>,
        forecaster: Arc<dyn ForecastComputer>,
        sink: Arc<dyn DownloadSink>,
        event_bus: EventBus,
    ) -> Self {
        let uploads = UploadManager::new(
            config.acceptance.clone(),
            config.timing.upload_step(),
            scheduler.clone(),
            event_bus.clone(),
        );
        let runner = StageRunner::new(
            default_stages(),
            config.timing.base_stage(),
            scheduler,
            forecaster,
            event_bus.clone(),
        );
        Self::new(uploads, runner, sink, event_bus)
    }

    /// Committed files
    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn required_file_count(&self) -> usize {
        self.required_file_count
    }

    pub fn uploads(&self) -> &UploadManager {
        &self.uploads
    }

    pub fn runner(&self) -> &StageRunner {
        &self.runner
    }

    /// True while the Stage Runner is bound to the current file set
    pub fn is_runner_active(&self) -> bool {
        self.active_run.is_some()
    }

    /// Snapshot of the run state
    pub fn run_state(&self) -> RunState {
        self.runner.state()
    }

    /// Watch run state changes
    pub fn subscribe_run_state(&self) -> watch::Receiver<RunState> {
        self.runner.subscribe()
    }

    /// `"n/3 files uploaded..."` while some but not all files are committed
    pub fn pending_hint(&self) -> Option<String> {
        let count = self.files.len();
        if count == 0 || count >= self.required_file_count {
            return None;
        }
        Some(format!(
            "{}/{} files uploaded. Upload all {} files to start processing.",
            count, self.required_file_count, self.required_file_count
        ))
    }

    /// Submit a batch through the Upload Manager
    ///
    /// Returns once the batch is committed; when that brings the committed
    /// count to the required count the Stage Runner is already running.
    pub async fn submit_batch(&mut self, candidates: Vec<RawFile>) -> UploadResult<BatchOutcome> {
        let outcome = self.uploads.submit_batch(candidates).await?;
        self.handle_files_change(outcome.committed.clone());
        Ok(outcome)
    }

    /// Remove a committed file by position (no-op when out of range)
    pub fn remove_file(&mut self, index: usize) {
        if let Some(files) = self.uploads.remove_file(index) {
            self.handle_files_change(files);
        }
    }

    /// Wait until the active run reaches a terminal state
    ///
    /// Awaits the run task and logs its outcome. Returns the current state
    /// immediately when no run is active or its outcome was already collected.
    pub async fn wait_for_completion(&mut self) -> RunState {
        let Some(active) = self.active_run.as_mut() else {
            return self.runner.state();
        };
        let run_id = active.run_id;

        if let Some(task) = active.task.take() {
            match task.await {
                Ok(RunOutcome::Completed(metrics)) => {
                    tracing::debug!(run_id = %run_id, wmape = metrics.wmape, "Run outcome: completed");
                }
                Ok(RunOutcome::Failed(diagnostic)) => {
                    tracing::debug!(run_id = %run_id, error = %diagnostic, "Run outcome: failed");
                }
                Ok(RunOutcome::Abandoned) => {
                    tracing::debug!(run_id = %run_id, "Run outcome: abandoned");
                }
                Err(e) => {
                    tracing::error!(run_id = %run_id, error = %e, "Run task did not finish");
                }
            }
        }

        self.runner.state()
    }

    /// Export the completed run's predictions
    ///
    /// Encodes the payload, hands it to the save collaborator and notifies the
    /// user. Rejected with `NotReady` unless the run has completed.
    pub fn request_export(&self, format: ExportFormat) -> Result<ExportReceipt, ExportError> {
        let state = self.runner.state();
        let metrics = match (&state.metrics, state.is_completed) {
            (Some(metrics), true) => metrics,
            _ => {
                tracing::warn!(%format, status = state.status_label(), "Export requested before completion");
                return Err(ExportError::NotReady);
            }
        };

        let payload = ExportPayload::encode(format, &metrics.predictions);
        let location = self.sink.save(&payload.filename, &payload.bytes)?;

        tracing::info!(%format, file = %payload.filename, bytes = payload.bytes.len(), "Export started");
        self.event_bus.emit_lossy(ForecastEvent::notification(Notification::download_started(
            format.extension(),
            &payload.filename,
        )));

        Ok(ExportReceipt {
            format,
            filename: payload.filename,
            location,
            bytes: payload.bytes.len(),
        })
    }

    fn handle_files_change(&mut self, files: Vec<InputFile>) {
        self.files = files;

        if self.files.len() == self.required_file_count {
            if self.active_run.is_none() {
                self.activate();
            }
        } else {
            self.deactivate();
        }
    }

    fn activate(&mut self) {
        self.event_bus.emit_lossy(ForecastEvent::notification(Notification::upload_complete()));

        let run_id = self.runner.begin();
        let cancel = CancellationToken::new();
        let task = {
            let runner = self.runner.clone();
            let files = self.files.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { runner.run(run_id, files, cancel).await })
        };

        tracing::info!(run_id = %run_id, files = self.files.len(), "Stage runner activated");
        self.active_run = Some(ActiveRun {
            run_id,
            cancel,
            task: Some(task),
        });
    }

    fn deactivate(&mut self) {
        if let Some(active) = self.active_run.take() {
            tracing::info!(
                run_id = %active.run_id,
                files = self.files.len(),
                "Stage runner deactivated"
            );
            active.cancel.cancel();
        }
        self.runner.reset();
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if let Some(active) = &self.active_run {
            active.cancel.cancel();
        }
    }
}
