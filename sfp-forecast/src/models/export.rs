//! Export formats and payload encoding
//!
//! Both formats carry the same semicolon-delimited text payload with header
//! `week;store;product;quantity`. The format only selects the file extension.

use super::PredictionRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Header row of every export payload
pub const EXPORT_HEADER: &str = "week;store;product;quantity";

/// Base name of exported files
pub const EXPORT_BASENAME: &str = "forecast_predictions";

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }

    /// `forecast_predictions.<ext>`
    pub fn filename(&self) -> String {
        format!("{}.{}", EXPORT_BASENAME, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "parquet" => Ok(ExportFormat::Parquet),
            other => Err(format!("unknown export format '{}' (expected csv or parquet)", other)),
        }
    }
}

/// Encoded export ready to hand to the save collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportPayload {
    pub fn encode(format: ExportFormat, rows: &[PredictionRow]) -> Self {
        Self {
            format,
            filename: format.filename(),
            bytes: encode_rows(rows).into_bytes(),
        }
    }
}

/// Header plus one `week;store;product;quantity` line per row, no trailing newline
pub fn encode_rows(rows: &[PredictionRow]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(EXPORT_HEADER.to_string());
    lines.extend(
        rows.iter()
            .map(|r| format!("{};{};{};{}", r.week, r.store, r.product, r.quantity)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filenames() {
        assert_eq!(ExportFormat::Csv.filename(), "forecast_predictions.csv");
        assert_eq!(ExportFormat::Parquet.filename(), "forecast_predictions.parquet");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!(" parquet ".parse::<ExportFormat>(), Ok(ExportFormat::Parquet));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_encode_rows_header_first() {
        let rows = [PredictionRow::new(1, 1023, 123, 120), PredictionRow::new(1, 1045, 234, 85)];
        let text = encode_rows(&rows);
        assert_eq!(text, "week;store;product;quantity\n1;1023;123;120\n1;1045;234;85");
    }

    #[test]
    fn test_encode_empty_is_header_only() {
        assert_eq!(encode_rows(&[]), EXPORT_HEADER);
    }
}
