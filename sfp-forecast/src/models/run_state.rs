//! Stage Runner state
//!
//! Idle → Running → Completed | Failed, and back to Idle only through an
//! explicit reset. `is_running` and `is_completed` are never both true.

use super::MetricsBundle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Observable state of the Stage Runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Identifier of the current (or last) run, None while idle
    pub run_id: Option<Uuid>,

    pub is_running: bool,

    /// Percent complete (0-100), non-decreasing within a run
    pub progress_percent: u8,

    /// Index of the running stage
    pub current_stage: Option<usize>,

    pub current_stage_label: String,

    pub is_completed: bool,

    /// Set only when a run completed
    pub metrics: Option<MetricsBundle>,

    /// Diagnostic when the forecast computation failed
    pub failure: Option<String>,

    pub started_at: Option<DateTime<Utc>>,

    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            run_id: None,
            is_running: false,
            progress_percent: 0,
            current_stage: None,
            current_stage_label: String::new(),
            is_completed: false,
            metrics: None,
            failure: None,
            started_at: None,
            ended_at: None,
        }
    }
}

impl RunState {
    /// Fresh running state for a new run
    pub fn started(run_id: Uuid) -> Self {
        Self {
            run_id: Some(run_id),
            is_running: true,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// No run in progress and no result held
    pub fn is_idle(&self) -> bool {
        self.run_id.is_none()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Completed or failed
    pub fn is_terminal(&self) -> bool {
        self.is_completed || self.is_failed()
    }

    /// True if this state belongs to the given run
    pub fn belongs_to(&self, run_id: Uuid) -> bool {
        self.run_id == Some(run_id)
    }

    /// Status line for display
    pub fn status_label(&self) -> &'static str {
        if self.is_completed {
            "Completed"
        } else if self.is_failed() {
            "Failed"
        } else if self.is_running {
            "Processing..."
        } else {
            "Waiting"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = RunState::default();
        assert!(state.is_idle());
        assert!(!state.is_running);
        assert!(!state.is_completed);
        assert!(!state.is_terminal());
        assert_eq!(state.progress_percent, 0);
        assert_eq!(state.status_label(), "Waiting");
    }

    #[test]
    fn test_started_is_running_from_zero() {
        let run_id = Uuid::new_v4();
        let state = RunState::started(run_id);
        assert!(state.belongs_to(run_id));
        assert!(!state.belongs_to(Uuid::new_v4()));
        assert!(state.is_running);
        assert!(!state.is_completed);
        assert_eq!(state.progress_percent, 0);
        assert!(state.started_at.is_some());
        assert_eq!(state.status_label(), "Processing...");
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut state = RunState::started(Uuid::new_v4());
        state.is_running = false;
        state.failure = Some("model diverged".to_string());
        assert!(state.is_terminal());
        assert!(!state.is_completed);
        assert_eq!(state.status_label(), "Failed");
    }
}
