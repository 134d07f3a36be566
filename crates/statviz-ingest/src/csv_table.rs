//! CSV parsing into a [`Dataset`].

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

use csv::ReaderBuilder;
use tracing::{debug, info};

use statviz_model::{CellValue, ColumnDefinition, DataRow, Dataset};

use crate::error::{IngestError, Result};

pub(crate) fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

/// Make header names unique so no column shadows another.
///
/// Blank names become `__EMPTY`, `__EMPTY_1`, ... and repeats of a name get a
/// numeric suffix (`Yield`, `Yield_1`, ...), skipping names already taken.
pub(crate) fn unique_headers(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let base = if name.is_empty() { "__EMPTY".to_string() } else { name };
            let mut candidate = base.clone();
            while taken.contains(&candidate) {
                let suffix = next_suffix.entry(base.clone()).or_insert(1);
                candidate = format!("{base}_{suffix}");
                *suffix += 1;
            }
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Type a raw CSV field: number, boolean, empty or text.
pub fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(value) = trimmed.parse::<f64>()
        && value.is_finite()
    {
        return CellValue::Number(value);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    CellValue::Text(trimmed.to_string())
}

/// Build a dataset from a header and raw records.
///
/// Blank records are dropped; short records are padded with empty cells and
/// fields past the header are ignored.
pub(crate) fn rows_from_records(
    source_name: &str,
    headers: Vec<String>,
    records: impl IntoIterator<Item = Vec<CellValue>>,
) -> Dataset {
    let columns: Vec<ColumnDefinition> = headers.iter().map(ColumnDefinition::new).collect();
    let mut rows = Vec::new();
    for record in records {
        if record.iter().all(CellValue::is_blank) {
            continue;
        }
        let mut cells = record.into_iter();
        let row: DataRow = headers
            .iter()
            .map(|header| (header.clone(), cells.next().unwrap_or(CellValue::Empty)))
            .collect();
        rows.push(row);
    }
    Dataset::new(source_name, columns, rows)
}

/// Parse CSV bytes. The first non-blank record is the header row.
pub fn read_csv_bytes(source_name: &str, bytes: &[u8]) -> Result<Dataset> {
    let start = Instant::now();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut header: Option<Vec<String>> = None;
    let mut records: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::Unreadable {
            source_name: source_name.to_string(),
            message: err.to_string(),
        })?;
        match header {
            None => {
                if record.iter().all(|field| field.trim().trim_matches('\u{feff}').is_empty()) {
                    continue;
                }
                header = Some(unique_headers(record.iter().map(normalize_header)));
            }
            Some(_) => records.push(record.iter().map(parse_cell).collect()),
        }
    }

    let Some(headers) = header else {
        return Err(IngestError::Empty {
            source_name: source_name.to_string(),
        });
    };
    debug!(source = %source_name, columns = headers.len(), "csv header read");
    let dataset = rows_from_records(source_name, headers, records);
    info!(
        source = %source_name,
        rows = dataset.rows.len(),
        columns = dataset.columns.len(),
        duration_ms = start.elapsed().as_millis(),
        "csv parsed"
    );
    Ok(dataset)
}

/// Parse a CSV file from disk.
pub fn read_csv_path(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_csv_bytes(&name, &bytes)
}
