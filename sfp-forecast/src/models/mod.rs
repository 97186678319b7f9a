//! Data models for sfp-forecast
//!
//! - Input files and upload candidates
//! - Stage table and run state
//! - Terminal metrics bundle and export payloads

pub mod export;
pub mod input_file;
pub mod metrics;
pub mod run_state;
pub mod stage;

pub use export::{ExportFormat, ExportPayload, EXPORT_HEADER};
pub use input_file::{InputFile, RawFile};
pub use metrics::{MetricCard, MetricsBundle, PredictionRow, Trend};
pub use run_state::RunState;
pub use stage::{default_stages, stage_target_percent, StageDescriptor, StageKind, FAILED_LABEL, FINISHED_LABEL};
