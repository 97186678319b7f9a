//! Submitted input files
//!
//! A `RawFile` is a candidate as handed over by the host (file picker, drop
//! target, command line). Once the Upload Manager accepts it and its simulated
//! transfer finishes it becomes an immutable `InputFile`.

use serde::{Deserialize, Serialize};
use sfp_common::human_format::format_file_size;
use std::path::{Path, PathBuf};

/// Candidate file submitted for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub size_bytes: u64,
    /// Tag used for acceptance matching (extension like `.parquet`, or MIME)
    pub type_tag: String,
    /// Local path, when the candidate came from the filesystem
    pub path: Option<PathBuf>,
}

impl RawFile {
    /// Candidate with an explicit type tag
    pub fn new(name: impl Into<String>, size_bytes: u64, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            type_tag: type_tag.into(),
            path: None,
        }
    }

    /// Candidate whose type tag is derived from its name's extension
    pub fn from_name(name: impl Into<String>, size_bytes: u64) -> Self {
        let name = name.into();
        let type_tag = extension_tag(Path::new(&name));
        Self {
            name,
            size_bytes,
            type_tag,
            path: None,
        }
    }

    /// Candidate read from the filesystem (size from metadata)
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            type_tag: extension_tag(path),
            path: Some(path.to_path_buf()),
        })
    }
}

/// `.ext` tag from a path, lowercased; empty when there is no extension
fn extension_tag(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Accepted, fully transferred input file
///
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    name: String,
    size_bytes: u64,
    type_tag: String,
    path: Option<PathBuf>,
}

impl InputFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size for display (`1.5 GB`)
    pub fn display_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

impl From<RawFile> for InputFile {
    fn from(raw: RawFile) -> Self {
        Self {
            name: raw.name,
            size_bytes: raw.size_bytes,
            type_tag: raw.type_tag,
            path: raw.path,
        }
    }
}
