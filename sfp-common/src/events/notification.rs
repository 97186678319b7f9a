//! User-facing notification payloads
//!
//! Fire-and-forget `{title, description}` pairs consumed by whatever toast
//! display the host provides.

use serde::{Deserialize, Serialize};

/// Notification shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Fired once the required number of files is committed
    pub fn upload_complete() -> Self {
        Self::new(
            "Files uploaded successfully!",
            "Starting data processing...",
        )
    }

    /// Fired after an export payload was handed to the save collaborator
    ///
    /// `format_label` is shown upper-cased (e.g. `CSV`).
    pub fn download_started(format_label: &str, filename: &str) -> Self {
        Self::new(
            format!("Download started - {}", format_label.to_uppercase()),
            format!("File {} was downloaded successfully!", filename),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_started_uppercases_format() {
        let n = Notification::download_started("parquet", "forecast_predictions.parquet");
        assert_eq!(n.title, "Download started - PARQUET");
        assert_eq!(
            n.description,
            "File forecast_predictions.parquet was downloaded successfully!"
        );
    }
}
