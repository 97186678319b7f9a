//! Stage Runner
//!
//! Runs the fixed stage sequence once per qualifying file set:
//! 1. `begin()` switches the state to running at 0%
//! 2. For each stage, the label is published and progress climbs one percent
//!    per tick up to the stage's cumulative target; ticks follow a cumulative
//!    millisecond schedule so each stage lasts exactly its duration
//! 3. After the last stage the forecast computation supplies the metrics and
//!    the run ends completed at exactly 100% (or failed, if the computation
//!    reports an error)
//!
//! State is published through a `watch` channel. Every write is tagged with
//! the run id, so a run that was abandoned (file set dropped below the
//! required count) can never overwrite a reset state.

use super::{ForecastComputer, Scheduler};
use crate::models::{
    stage_target_percent, InputFile, MetricsBundle, RunState, StageDescriptor, FAILED_LABEL,
    FINISHED_LABEL,
};
use chrono::Utc;
use sfp_common::events::{EventBus, ForecastEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(MetricsBundle),
    Failed(String),
    /// Run was deactivated before reaching a terminal state
    Abandoned,
}

/// Stage Runner service
///
/// Cheap to clone; clones share the same state channel.
#[derive(Clone)]
pub struct StageRunner {
    stages: Arc<Vec<StageDescriptor>>,
    base_stage: Duration,
    scheduler: Arc<dyn Scheduler>,
    forecaster: Arc<dyn ForecastComputer>,
    state_tx: Arc<watch::Sender<RunState>>,
    event_bus: EventBus,
}

impl StageRunner {
    pub fn new(
        stages: Vec<StageDescriptor>,
        base_stage: Duration,
        scheduler: Arc<dyn Scheduler>,
        forecaster: Arc<dyn ForecastComputer>,
        event_bus: EventBus,
    ) -> Self {
        let (state_tx, _) = watch::channel(RunState::default());
        Self {
            stages: Arc::new(stages),
            base_stage,
            scheduler,
            forecaster,
            state_tx: Arc::new(state_tx),
            event_bus,
        }
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    /// Sum of all stage durations
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration(self.base_stage)).sum()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RunState {
        self.state_tx.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state_tx.subscribe()
    }

    /// Start a fresh run: running, 0%, new run id
    pub fn begin(&self) -> Uuid {
        let run_id = Uuid::new_v4();
        self.state_tx.send_replace(RunState::started(run_id));
        tracing::info!(run_id = %run_id, stages = self.stages.len(), "Run started");
        run_id
    }

    /// Return to the idle state, discarding any run result
    pub fn reset(&self) {
        let previous = self.state_tx.send_replace(RunState::default());
        if let Some(run_id) = previous.run_id {
            tracing::info!(
                run_id = %run_id,
                progress = previous.progress_percent,
                "Run state reset"
            );
            self.event_bus.emit_lossy(ForecastEvent::RunReset { timestamp: Utc::now() });
        }
    }

    /// Drive run `run_id` (from `begin()`) through every stage
    ///
    /// Returns `Abandoned` as soon as `cancel` fires or the state stops
    /// belonging to this run.
    pub async fn run(
        &self,
        run_id: Uuid,
        files: Vec<InputFile>,
        cancel: CancellationToken,
    ) -> RunOutcome {
        let stage_count = self.stages.len();
        let mut progress: u8 = 0;

        for stage in self.stages.iter() {
            let target = stage_target_percent(stage.ordinal, stage_count);

            let label = stage.label.clone();
            if !self.update(run_id, |state| {
                state.current_stage = Some(stage.ordinal);
                state.current_stage_label = label;
            }) {
                return RunOutcome::Abandoned;
            }

            tracing::info!(
                run_id = %run_id,
                stage = stage.ordinal + 1,
                of = stage_count,
                target,
                "{}",
                stage.label
            );
            self.event_bus.emit_lossy(ForecastEvent::StageStarted {
                run_id,
                ordinal: stage.ordinal,
                label: stage.label.clone(),
                target_percent: target,
                timestamp: Utc::now(),
            });

            let units = target.saturating_sub(progress);
            if units == 0 {
                tracing::debug!(run_id = %run_id, stage = stage.ordinal, "Stage already at target");
                continue;
            }
            let stage_duration = stage.duration(self.base_stage);

            for tick in 1..=u32::from(units) {
                progress += 1;
                if !self.update(run_id, |state| state.progress_percent = progress) {
                    return RunOutcome::Abandoned;
                }
                self.event_bus.emit_lossy(ForecastEvent::RunProgress {
                    run_id,
                    percent: progress,
                    timestamp: Utc::now(),
                });
                tracing::trace!(run_id = %run_id, percent = progress, "Run progress");

                tokio::select! {
                    _ = cancel.cancelled() => return self.abandon(run_id),
                    _ = self.scheduler.after(tick_delay(stage_duration, units, tick)) => {}
                }
            }
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return self.abandon(run_id),
            result = self.forecaster.compute_forecast(&files) => result,
        };

        match result {
            Ok(metrics) => self.complete(run_id, metrics),
            Err(e) => self.fail(run_id, e.to_string()),
        }
    }

    fn complete(&self, run_id: Uuid, metrics: MetricsBundle) -> RunOutcome {
        let bundle = metrics.clone();
        if !self.update(run_id, |state| {
            state.is_running = false;
            state.is_completed = true;
            state.progress_percent = 100;
            state.current_stage = None;
            state.current_stage_label = FINISHED_LABEL.to_string();
            state.metrics = Some(bundle);
            state.ended_at = Some(Utc::now());
        }) {
            return RunOutcome::Abandoned;
        }

        tracing::info!(
            run_id = %run_id,
            wmape = metrics.wmape,
            target_achieved = metrics.target_achieved(),
            predictions = metrics.total_predictions,
            "Run completed"
        );
        self.event_bus.emit_lossy(ForecastEvent::RunCompleted {
            run_id,
            wmape: metrics.wmape,
            total_predictions: metrics.total_predictions,
            timestamp: Utc::now(),
        });
        RunOutcome::Completed(metrics)
    }

    fn fail(&self, run_id: Uuid, diagnostic: String) -> RunOutcome {
        let failure = diagnostic.clone();
        if !self.update(run_id, |state| {
            state.is_running = false;
            state.is_completed = false;
            state.current_stage_label = FAILED_LABEL.to_string();
            state.failure = Some(failure);
            state.ended_at = Some(Utc::now());
        }) {
            return RunOutcome::Abandoned;
        }

        tracing::error!(run_id = %run_id, error = %diagnostic, "Run failed");
        self.event_bus.emit_lossy(ForecastEvent::RunFailed {
            run_id,
            diagnostic: diagnostic.clone(),
            timestamp: Utc::now(),
        });
        RunOutcome::Failed(diagnostic)
    }

    fn abandon(&self, run_id: Uuid) -> RunOutcome {
        tracing::info!(run_id = %run_id, "Run abandoned");
        RunOutcome::Abandoned
    }

    /// Apply `f` if the state still belongs to `run_id`
    fn update(&self, run_id: Uuid, f: impl FnOnce(&mut RunState)) -> bool {
        self.state_tx.send_if_modified(|state| {
            if !state.belongs_to(run_id) {
                return false;
            }
            f(state);
            true
        })
    }
}

/// Offset of tick `tick` (of `units`) from the start of its stage
///
/// Offsets are whole milliseconds, except the last which is the exact stage
/// duration, so tick delays never get rounded up by the timer and a stage's
/// ticks sum to its duration.
fn tick_offset(duration: Duration, units: u8, tick: u32) -> Duration {
    let units = u32::from(units);
    if tick >= units {
        return duration;
    }
    let millis = duration.as_millis() * u128::from(tick) / u128::from(units);
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// Delay before tick `tick` (1-based) of a stage
fn tick_delay(duration: Duration, units: u8, tick: u32) -> Duration {
    tick_offset(duration, units, tick).saturating_sub(tick_offset(duration, units, tick - 1))
}
