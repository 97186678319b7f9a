//! Configuration loading and resolution
//!
//! Bootstrap configuration comes from a TOML file resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SFP_CONFIG` environment variable
//! 3. Per-user config file (`<config_dir>/sales-forecaster/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A file named explicitly (tiers 1-2) must exist and parse. The per-user file
//! is optional: when it is missing the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SFP_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR_NAME: &str = "sales-forecaster";

/// Bootstrap configuration loaded from TOML
///
/// Every section is optional; missing keys fall back to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upload acceptance policy
    #[serde(default)]
    pub acceptance: AcceptancePolicy,

    /// Simulated transfer and stage timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Export destination
    #[serde(default)]
    pub export: ExportConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Upload acceptance policy
///
/// `max_files` doubles as the number of committed files required before
/// processing starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptancePolicy {
    /// Maximum committed files (and the required-to-start count)
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Maximum size of a single file in bytes
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Accepted type tags (extensions such as `.parquet`, or MIME types)
    #[serde(default = "default_accepted_types")]
    pub accepted_types: Vec<String>,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_size_bytes: default_max_size_bytes(),
            accepted_types: default_accepted_types(),
        }
    }
}

impl AcceptancePolicy {
    /// Check a type tag against the accepted set
    ///
    /// Comparison is case-insensitive and tolerant of a missing leading dot,
    /// so `parquet`, `.parquet` and `.PARQUET` all match `.parquet`.
    pub fn accepts_type(&self, type_tag: &str) -> bool {
        let candidate = normalize_type_tag(type_tag);
        if candidate.is_empty() {
            return false;
        }
        self.accepted_types
            .iter()
            .any(|accepted| normalize_type_tag(accepted) == candidate)
    }

    /// Validate policy values
    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            return Err(Error::Config("acceptance.max_files must be at least 1".to_string()));
        }
        if self.accepted_types.iter().all(|t| normalize_type_tag(t).is_empty()) {
            return Err(Error::Config(
                "acceptance.accepted_types must name at least one type".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lowercase a type tag and strip a leading dot from extension tags
fn normalize_type_tag(tag: &str) -> String {
    let trimmed = tag.trim().to_ascii_lowercase();
    match trimmed.strip_prefix('.') {
        Some(ext) => ext.to_string(),
        None => trimmed,
    }
}

/// Simulated transfer and stage timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between 10-unit upload progress steps (milliseconds)
    #[serde(default = "default_upload_step_ms")]
    pub upload_step_ms: u64,

    /// Duration of a weight-1 processing stage (milliseconds)
    #[serde(default = "default_base_stage_ms")]
    pub base_stage_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            upload_step_ms: default_upload_step_ms(),
            base_stage_ms: default_base_stage_ms(),
        }
    }
}

impl TimingConfig {
    pub fn upload_step(&self) -> Duration {
        Duration::from_millis(self.upload_step_ms)
    }

    pub fn base_stage(&self) -> Duration {
        Duration::from_millis(self.base_stage_ms)
    }
}

/// Export destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving exported files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_files() -> usize {
    3
}

fn default_max_size_bytes() -> u64 {
    5 * 1024 * 1024 * 1024 // 5 GiB
}

fn default_accepted_types() -> Vec<String> {
    vec![".parquet".to_string()]
}

fn default_upload_step_ms() -> u64 {
    100
}

fn default_base_stage_ms() -> u64 {
    1500
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    Defaults,
}

/// Resolve which config file to load, without reading it
///
/// Returns `ConfigSource::Defaults` when no explicit path is given and the
/// per-user file does not exist.
pub fn resolve_config_source(cli_arg: Option<&Path>) -> ConfigSource {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    if let Some(path) = user_config_path() {
        if path.exists() {
            return ConfigSource::UserFile(path);
        }
    }

    // Priority 4: Compiled defaults
    ConfigSource::Defaults
}

/// Per-user config file location for the current platform
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Load configuration following the resolution priority
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let source = resolve_config_source(cli_arg);

    let config = match &source {
        ConfigSource::CommandLine(path) | ConfigSource::Environment(path) => {
            read_toml_config(path)?
        }
        ConfigSource::UserFile(path) => match read_toml_config(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring unreadable user config {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        ConfigSource::Defaults => {
            info!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    config.acceptance.validate()?;
    Ok((config, source))
}

/// Read and parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
