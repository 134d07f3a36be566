//! Upload handling: file kind detection and the spreadsheet size policy.

use std::path::Path;

use tracing::warn;

use statviz_model::Dataset;

use crate::csv_table::read_csv_bytes;
use crate::error::{IngestError, Result};
use crate::workbook::read_workbook;

/// Spreadsheet size limit used by the pages that enforce one (1 MiB).
pub const DEFAULT_SPREADSHEET_LIMIT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    /// Detect by extension, case-insensitively.
    pub fn detect(name: &str) -> Option<Self> {
        let extension = Path::new(name)
            .extension()?
            .to_string_lossy()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_spreadsheet_bytes: Option<u64>,
}

impl UploadPolicy {
    pub const fn unlimited() -> Self {
        Self {
            max_spreadsheet_bytes: None,
        }
    }

    pub const fn with_spreadsheet_limit(bytes: u64) -> Self {
        Self {
            max_spreadsheet_bytes: Some(bytes),
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// A selected file, held until parsed or cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Upload {
    name: String,
    bytes: Option<Vec<u8>>,
}

impl Upload {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Some(bytes),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.bytes.as_ref().map_or(0, |bytes| bytes.len() as u64)
    }

    /// Drop the selection so the same file can be picked again.
    pub fn clear(&mut self) {
        self.bytes = None;
    }

    pub fn is_cleared(&self) -> bool {
        self.bytes.is_none()
    }
}

/// Parse an upload under `policy`.
///
/// Oversized spreadsheets and unsupported extensions are rejected before any
/// parse attempt, and the upload is cleared on every failure.
pub fn parse_upload(
    upload: &mut Upload,
    policy: &UploadPolicy,
    sheet: Option<&str>,
) -> Result<Dataset> {
    let result = parse_selected(upload, policy, sheet);
    if let Err(err) = &result {
        warn!(file = %upload.name(), error = %err, "upload rejected");
        upload.clear();
    }
    result
}

fn parse_selected(upload: &Upload, policy: &UploadPolicy, sheet: Option<&str>) -> Result<Dataset> {
    let Some(bytes) = upload.bytes() else {
        return Err(IngestError::Empty {
            source_name: upload.name().to_string(),
        });
    };
    let kind = FileKind::detect(upload.name()).ok_or_else(|| IngestError::UnsupportedFormat {
        source_name: upload.name().to_string(),
    })?;
    match kind {
        FileKind::Csv => read_csv_bytes(upload.name(), bytes),
        FileKind::Spreadsheet => {
            if let Some(limit) = policy.max_spreadsheet_bytes
                && upload.size() > limit
            {
                return Err(IngestError::TooLarge {
                    size: upload.size(),
                    limit,
                });
            }
            read_workbook(upload.name(), bytes, sheet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind() {
        assert_eq!(FileKind::detect("trial.CSV"), Some(FileKind::Csv));
        assert_eq!(FileKind::detect("trial.xlsx"), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::detect("trial.xls"), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::detect("trial.txt"), None);
        assert_eq!(FileKind::detect("trial"), None);
    }

    #[test]
    fn test_unsupported_extension_clears_upload() {
        let mut upload = Upload::from_bytes("notes.txt", b"a,b\n1,2\n".to_vec());
        let err = parse_upload(&mut upload, &UploadPolicy::unlimited(), None)
            .expect_err("txt is rejected");
        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
        assert!(upload.is_cleared());
    }
}
