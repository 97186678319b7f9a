//! # SFP Common Library
//!
//! Shared code for the SalesForecaster Pro workspace:
//! - Error types
//! - Event types (ForecastEvent enum) and the EventBus
//! - Configuration loading (TOML bootstrap + acceptance policy + timing)
//! - Human-readable formatting of sizes, counts and durations

pub mod config;
pub mod error;
pub mod events;
pub mod human_format;

pub use error::{Error, Result};
