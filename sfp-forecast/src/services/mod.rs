//! Service modules for the forecast page workflow
//!
//! - Upload Manager: acceptance policy and simulated transfers
//! - Stage Runner: staged processing state machine
//! - Orchestrator: ties the two together and serves exports
//! - Collaborator seams: scheduler, forecast computation, save sink
//! - Event logger draining the bus

pub mod download_sink;
pub mod event_logger;
pub mod forecaster;
pub mod orchestrator;
pub mod scheduler;
pub mod stage_runner;
pub mod upload_manager;

pub use download_sink::{DirectorySink, DownloadSink, MemorySink};
pub use event_logger::{log_events, EventLogSummary};
pub use forecaster::{ForecastComputer, SimulatedForecaster};
pub use orchestrator::{ExportReceipt, Orchestrator};
pub use scheduler::{ImmediateScheduler, Scheduler, TokioScheduler};
pub use stage_runner::{RunOutcome, StageRunner};
pub use upload_manager::{BatchOutcome, UploadManager, UploadProgress};
