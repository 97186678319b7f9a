//! Common error types for SFP

use thiserror::Error;

/// Common result type for SFP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SFP crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
