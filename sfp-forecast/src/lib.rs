//! sfp-forecast library interface
//!
//! Core of the sales forecast page: upload acceptance, staged processing,
//! orchestration and exports. The `sfp-forecast` binary is a thin host over
//! these APIs.

pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use crate::error::{ExportError, ForecastError, LoggingError, RejectionReason, UploadResult};
pub use crate::services::{ExportReceipt, Orchestrator};
