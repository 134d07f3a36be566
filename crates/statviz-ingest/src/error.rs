//! Error types for StatViz data ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading an uploaded file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Format Errors ===
    /// The file could not be parsed as CSV or as a workbook.
    #[error("could not read {source_name}: {message}")]
    Unreadable {
        source_name: String,
        message: String,
    },

    /// The file has no header row.
    #[error("{source_name} is empty")]
    Empty { source_name: String },

    /// The workbook contains no worksheets.
    #[error("{source_name} contains no sheets")]
    NoSheets { source_name: String },

    /// Requested worksheet is absent from the workbook.
    #[error("sheet '{sheet}' not found in workbook (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    /// File extension is neither CSV nor a spreadsheet.
    #[error("unsupported file type: {source_name} (expected .csv, .xlsx or .xls)")]
    UnsupportedFormat { source_name: String },

    // === Upload Policy Errors ===
    /// Spreadsheet exceeds the configured upload limit.
    #[error("file is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    // === Export Errors ===
    /// Nothing to write.
    #[error("no data to export")]
    NothingToExport,

    /// CSV writer failure.
    #[error("failed to write CSV: {message}")]
    Export { message: String },
}

impl IngestError {
    /// Short text suitable for display next to the upload control.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::TooLarge { limit, .. } => format!(
                "File too large. Max allowed size is {}.",
                format_limit(*limit)
            ),
            Self::SheetNotFound { sheet, .. } => {
                format!("Selected sheet \"{sheet}\" not found in workbook.")
            }
            Self::UnsupportedFormat { .. } => "Please upload a CSV or XLSX file.".to_string(),
            Self::Empty { .. } => "No data found in the file.".to_string(),
            Self::NothingToExport => "No data to export.".to_string(),
            Self::FileRead { .. } | Self::Unreadable { .. } | Self::NoSheets { .. } => {
                "Failed to read the file. Please ensure it is a valid CSV or spreadsheet."
                    .to_string()
            }
            Self::Export { .. } => "Failed to export data.".to_string(),
        }
    }
}

fn format_limit(limit: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if limit >= MIB && limit % MIB == 0 {
        format!("{} MB", limit / MIB)
    } else {
        format!("{limit} bytes")
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
