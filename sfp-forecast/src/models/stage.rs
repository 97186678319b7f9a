//! Processing stage table
//!
//! Seven stages run in order:
//! LOADING → ANALYZING → PREPARING → TRAINING → VALIDATING → GENERATING → FINALIZING
//!
//! Each stage has a duration weight; training counts double.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Processing stage identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StageKind {
    /// Read the submitted columnar files
    Loading,
    /// Sales pattern analysis
    Analyzing,
    /// Feature preparation for the model
    Preparing,
    /// Model training
    Training,
    /// Prediction validation
    Validating,
    /// Forecast file generation
    Generating,
    /// Wrap-up
    Finalizing,
}

/// One entry of the ordered stage sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    /// 0-based position in the sequence
    pub ordinal: usize,
    pub kind: StageKind,
    /// Label shown while the stage runs
    pub label: String,
    /// Duration multiplier applied to the base stage duration
    pub weight: u32,
}

impl StageDescriptor {
    /// Stage duration for a given base duration
    pub fn duration(&self, base: Duration) -> Duration {
        base * self.weight
    }
}

/// Label shown once every stage has finished
pub const FINISHED_LABEL: &str = "Processing complete!";

/// Label shown when the forecast computation failed
pub const FAILED_LABEL: &str = "Processing failed";

/// The reference stage sequence
pub fn default_stages() -> Vec<StageDescriptor> {
    [
        (StageKind::Loading, "Loading data from parquet files...", 1),
        (StageKind::Analyzing, "Analyzing sales patterns...", 1),
        (StageKind::Preparing, "Preparing features for the model...", 1),
        (StageKind::Training, "Training machine learning model...", 2),
        (StageKind::Validating, "Validating predictions...", 1),
        (StageKind::Generating, "Generating forecast file...", 1),
        (StageKind::Finalizing, "Finalizing processing...", 1),
    ]
    .into_iter()
    .enumerate()
    .map(|(ordinal, (kind, label, weight))| StageDescriptor {
        ordinal,
        kind,
        label: label.to_string(),
        weight,
    })
    .collect()
}

/// Cumulative percent reached at the end of stage `ordinal`
///
/// Integer floor of `(ordinal + 1) / stage_count * 100`; the last stage always
/// maps to 100.
pub fn stage_target_percent(ordinal: usize, stage_count: usize) -> u8 {
    if stage_count == 0 || ordinal + 1 >= stage_count {
        return 100;
    }
    (((ordinal + 1) * 100) / stage_count) as u8
}
