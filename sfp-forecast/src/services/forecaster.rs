//! Forecast computation seam
//!
//! The Stage Runner asks a `ForecastComputer` for the terminal metrics once
//! every stage has finished. `SimulatedForecaster` reports a fixed bundle; a
//! real model plugs in here without touching the state machine.

use crate::error::ForecastError;
use crate::models::{InputFile, MetricsBundle, PredictionRow, Trend};
use async_trait::async_trait;
use std::time::Duration;

/// Produces the terminal metrics for a set of input files
#[async_trait]
pub trait ForecastComputer: Send + Sync {
    async fn compute_forecast(&self, files: &[InputFile]) -> Result<MetricsBundle, ForecastError>;
}

/// Reference sample rows (week;store;product;quantity)
const SAMPLE_PREDICTIONS: [PredictionRow; 10] = [
    PredictionRow::new(1, 1023, 123, 120),
    PredictionRow::new(1, 1045, 234, 85),
    PredictionRow::new(2, 1023, 456, 110),
    PredictionRow::new(2, 1045, 123, 95),
    PredictionRow::new(3, 1023, 234, 130),
    PredictionRow::new(3, 1045, 456, 88),
    PredictionRow::new(4, 1023, 123, 115),
    PredictionRow::new(4, 1045, 234, 92),
    PredictionRow::new(5, 1023, 456, 125),
    PredictionRow::new(5, 1045, 123, 98),
];

/// Fixed-result forecaster
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedForecaster;

impl SimulatedForecaster {
    /// The constant bundle every simulated run reports
    pub fn reference_bundle() -> MetricsBundle {
        MetricsBundle {
            wmape: 0.487231,
            wmape_target: 0.575323,
            wmape_trend: Some(Trend {
                value: 15.3,
                is_positive: true,
            }),
            total_predictions: 45_820,
            model_accuracy: 0.942,
            accuracy_trend: Some(Trend {
                value: 8.7,
                is_positive: true,
            }),
            processing_time: Duration::from_secs(154),
            forecast_weeks: 5,
            predictions: SAMPLE_PREDICTIONS.to_vec(),
        }
    }
}

#[async_trait]
impl ForecastComputer for SimulatedForecaster {
    async fn compute_forecast(&self, files: &[InputFile]) -> Result<MetricsBundle, ForecastError> {
        let total_bytes: u64 = files.iter().map(InputFile::size_bytes).sum();
        tracing::debug!(
            files = files.len(),
            total_bytes,
            "Reporting simulated forecast metrics"
        );
        Ok(Self::reference_bundle())
    }
}
