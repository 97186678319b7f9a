//! Error types for sfp-forecast
//!
//! - Upload rejections are recoverable: the offending file is dropped and the
//!   rest of the batch proceeds (except `TooManyFiles`, which refuses the
//!   whole batch).
//! - Export errors reject requests made before a run completed.
//! - Forecast errors come from the injected forecast computation and end a
//!   run in the failed state.
//! - Logging errors come from installing or reloading the tracing filter.

use thiserror::Error;

/// Why a candidate file (or a whole batch) was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    /// Batch would push the committed count past the limit
    #[error("Too many files: {current} committed + {submitted} submitted exceeds limit of {max}")]
    TooManyFiles {
        current: usize,
        submitted: usize,
        max: usize,
    },

    /// File exceeds the per-file size limit
    #[error("File too large: {file} is {size_bytes} bytes (max {max_bytes})")]
    FileTooLarge {
        file: String,
        size_bytes: u64,
        max_bytes: u64,
    },

    /// File type tag is not in the accepted set
    #[error("Unsupported file type: {file} ({type_tag})")]
    UnsupportedType { file: String, type_tag: String },
}

/// Export request failures
#[derive(Debug, Error)]
pub enum ExportError {
    /// No completed run to export from
    #[error("Results not ready: processing has not completed")]
    NotReady,

    /// Save collaborator could not store the payload
    #[error("Save failed: {0}")]
    Save(String),

    /// I/O error writing the payload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Forecast computation failures
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Computation failed with a diagnostic
    #[error("Forecast computation failed: {0}")]
    Computation(String),
}

/// Tracing setup failures
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Configured level is not a valid filter directive
    #[error("Invalid log level '{level}': {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Log filter reload failed: {0}")]
    Reload(#[from] tracing_subscriber::reload::Error),

    #[error("Tracing subscriber already installed: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, RejectionReason>;
