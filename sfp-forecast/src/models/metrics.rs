//! Terminal metrics bundle
//!
//! Produced once per run by the forecast computation and immutable afterwards.
//! Carries the summary figures plus the sample prediction rows the exports are
//! built from.

use serde::{Deserialize, Serialize};
use sfp_common::human_format::{format_count, format_elapsed};
use std::time::Duration;

/// One forecast row: quantity predicted for a product at a store in a week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub week: u32,
    /// Point-of-sale id
    pub store: u32,
    pub product: u32,
    pub quantity: u32,
}

impl PredictionRow {
    pub const fn new(week: u32, store: u32, product: u32, quantity: u32) -> Self {
        Self {
            week,
            store,
            product,
            quantity,
        }
    }
}

/// Change relative to baseline, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub value: f64,
    pub is_positive: bool,
}

impl Trend {
    /// `+15.3% vs baseline`
    pub fn display(&self) -> String {
        let sign = if self.is_positive { "+" } else { "" };
        format!("{}{}% vs baseline", sign, self.value)
    }
}

/// Display card for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
    pub description: String,
    pub trend: Option<Trend>,
}

/// Summary figures reported when a run completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    /// Weighted mean absolute percentage error achieved
    pub wmape: f64,
    /// WMAPE the forecast has to stay under
    pub wmape_target: f64,
    pub wmape_trend: Option<Trend>,
    /// Number of (week, store, product) predictions
    pub total_predictions: u64,
    /// Cross-validation accuracy (0.0-1.0)
    pub model_accuracy: f64,
    pub accuracy_trend: Option<Trend>,
    /// Total execution time
    pub processing_time: Duration,
    /// Forecast weeks covered
    pub forecast_weeks: u32,
    /// Sample rows used for exports
    pub predictions: Vec<PredictionRow>,
}

impl MetricsBundle {
    pub fn target_achieved(&self) -> bool {
        self.wmape < self.wmape_target
    }

    /// The four dashboard cards
    pub fn cards(&self) -> Vec<MetricCard> {
        vec![
            MetricCard {
                title: "WMAPE Achieved".to_string(),
                value: format!("{:.6}", self.wmape),
                description: format!("Target: < {:.6}", self.wmape_target),
                trend: self.wmape_trend,
            },
            MetricCard {
                title: "Total Predictions".to_string(),
                value: format_count(self.total_predictions),
                description: format!("{} weeks × stores × products", self.forecast_weeks),
                trend: None,
            },
            MetricCard {
                title: "Model Accuracy".to_string(),
                value: format!("{:.1}%", self.model_accuracy * 100.0),
                description: "Cross-validation score".to_string(),
                trend: self.accuracy_trend,
            },
            MetricCard {
                title: "Processing Time".to_string(),
                value: format_elapsed(self.processing_time.as_secs()),
                description: "Total execution time".to_string(),
                trend: None,
            },
        ]
    }
}
