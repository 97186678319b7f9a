//! Tracing setup for the host binary
//!
//! The subscriber goes in before configuration is loaded so config resolution
//! is logged. The filter starts from `RUST_LOG` (or `info`) and switches to the
//! configured `[logging] level` once it is known, unless `RUST_LOG` was set.

use crate::error::LoggingError;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter used until the configuration has been read
const BOOTSTRAP_LEVEL: &str = "info";

/// Reloadable log filter
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Filter layer plus its control handle
    ///
    /// `env_directives` is the `RUST_LOG` value, if set. Unparseable
    /// directives fall back to the bootstrap level.
    pub fn new(env_directives: Option<&str>) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let (filter, from_env) = match env_directives.map(EnvFilter::try_new) {
            Some(Ok(filter)) => (filter, true),
            _ => (EnvFilter::new(BOOTSTRAP_LEVEL), false),
        };
        let (layer, handle) = reload::Layer::new(filter);
        (layer, Self { handle, from_env })
    }

    /// True when `RUST_LOG` chose the filter
    pub fn from_env(&self) -> bool {
        self.from_env
    }

    /// Switch to the configured level
    ///
    /// Returns `false` (and changes nothing) when `RUST_LOG` chose the filter.
    pub fn apply_config_level(&self, level: &str) -> Result<bool, LoggingError> {
        if self.from_env {
            return Ok(false);
        }
        let filter = EnvFilter::try_new(level).map_err(|source| LoggingError::InvalidLevel {
            level: level.to_string(),
            source,
        })?;
        self.handle.reload(filter)?;
        Ok(true)
    }
}

/// Install the global subscriber with `fmt` output
pub fn init() -> Result<LogFilter, LoggingError> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter_layer, filter) = LogFilter::new(env_directives.as_deref());
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(filter)
}
