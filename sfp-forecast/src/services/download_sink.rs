//! Save collaborator
//!
//! Receives an encoded export payload and stores it somewhere the user can
//! reach. `DirectorySink` writes files; `MemorySink` keeps them in memory.

use crate::error::ExportError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stores export payloads
pub trait DownloadSink: Send + Sync {
    /// Save `payload` under `filename`, returning where it went
    fn save(&self, filename: &str, payload: &[u8]) -> Result<String, ExportError>;
}

/// Writes payloads into a directory, replacing existing files
#[derive(Debug, Clone)]
pub struct DirectorySink {
    output_dir: PathBuf,
}

impl DirectorySink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, filename: &str, payload: &[u8]) -> Result<String, ExportError> {
        // Plain file names only
        if filename.is_empty() || Path::new(filename).file_name() != Some(OsStr::new(filename)) {
            return Err(ExportError::Save(format!("invalid file name '{}'", filename)));
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(filename);
        std::fs::write(&path, payload)?;

        tracing::info!(path = %path.display(), bytes = payload.len(), "Export saved");
        Ok(path.display().to_string())
    }
}

/// Keeps saved payloads in memory, in save order
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, filename: &str, payload: &[u8]) -> Result<String, ExportError> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| ExportError::Save("memory sink poisoned".to_string()))?;
        saved.push((filename.to_string(), payload.to_vec()));
        Ok(format!("memory://{}", filename))
    }
}
