//! Workbook (`.xlsx` / `.xls`) parsing through calamine.

use std::io::Cursor;
use std::time::Instant;

use calamine::{Data, Reader, Sheets, open_workbook_auto_from_rs};
use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use statviz_model::{CellValue, Dataset};

use crate::csv_table::{normalize_header, rows_from_records, unique_headers};
use crate::error::{IngestError, Result};

type Workbook = Sheets<Cursor<Vec<u8>>>;

fn open(source_name: &str, bytes: &[u8]) -> Result<Workbook> {
    open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|err| {
        IngestError::Unreadable {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    })
}

/// Worksheet names in workbook order.
pub fn sheet_names(source_name: &str, bytes: &[u8]) -> Result<Vec<String>> {
    Ok(open(source_name, bytes)?.sheet_names())
}

/// Parse one worksheet, the first one when `sheet` is `None`.
pub fn read_workbook(
    source_name: &str,
    bytes: &[u8],
    sheet: Option<&str>,
) -> Result<Dataset> {
    let start = Instant::now();
    let mut workbook = open(source_name, bytes)?;
    let names = workbook.sheet_names();
    let target = match sheet {
        Some(requested) => {
            if !names.iter().any(|name| name == requested) {
                return Err(IngestError::SheetNotFound {
                    sheet: requested.to_string(),
                    available: names,
                });
            }
            requested.to_string()
        }
        None => names.first().cloned().ok_or_else(|| IngestError::NoSheets {
            source_name: source_name.to_string(),
        })?,
    };

    let range = workbook
        .worksheet_range(&target)
        .map_err(|err| IngestError::Unreadable {
            source_name: source_name.to_string(),
            message: err.to_string(),
        })?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>())
        .skip_while(|row| row.iter().all(CellValue::is_blank));
    let Some(header_row) = rows.next() else {
        return Err(IngestError::Empty {
            source_name: source_name.to_string(),
        });
    };
    let headers = header_names(&header_row);
    debug!(
        source = %source_name,
        sheet = %target,
        columns = headers.len(),
        "sheet header read"
    );

    let dataset = rows_from_records(source_name, headers, rows);
    info!(
        source = %source_name,
        sheet = %target,
        rows = dataset.rows.len(),
        columns = dataset.columns.len(),
        duration_ms = start.elapsed().as_millis(),
        "sheet parsed"
    );
    Ok(dataset)
}

fn header_names(cells: &[CellValue]) -> Vec<String> {
    unique_headers(cells.iter().map(|cell| normalize_header(&cell.to_string())))
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Boolean(*value),
        Data::Error(err) => CellValue::Text(format!("#{err:?}")),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => CellValue::Text(date.format("%Y-%m-%d").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(value) => CellValue::Text(iso_date_part(value)),
        Data::DurationIso(value) => CellValue::Text(value.clone()),
    }
}

/// Convert a 1900-system serial day number to a calendar date.
///
/// Serials below 60 predate the phantom 1900-02-29, so they count from
/// 1899-12-31; later serials count from 1899-12-30. Serial 60 is that
/// phantom day and has no calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.floor() as u64;
    if days == 60 {
        return None;
    }
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_days(Days::new(days))
}

fn iso_date_part(value: &str) -> String {
    let date = value.split(['T', ' ']).next().unwrap_or(value);
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%Y-%m-%d").to_string(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_dates() {
        let fmt = |serial| excel_serial_to_date(serial).map(|d| d.format("%Y-%m-%d").to_string());
        assert_eq!(fmt(1.0).as_deref(), Some("1900-01-01"));
        assert_eq!(fmt(59.0).as_deref(), Some("1900-02-28"));
        assert_eq!(fmt(60.0), None);
        assert_eq!(fmt(60.5), None);
        assert_eq!(fmt(61.0).as_deref(), Some("1900-03-01"));
        assert_eq!(fmt(45292.0).as_deref(), Some("2024-01-01"));
        assert_eq!(fmt(45366.75).as_deref(), Some("2024-03-15"));
        assert_eq!(fmt(-1.0), None);
    }

    #[test]
    fn test_iso_date_part() {
        assert_eq!(iso_date_part("2024-03-15T10:30:00"), "2024-03-15");
        assert_eq!(iso_date_part("not a date"), "not a date");
    }

    #[test]
    fn test_blank_headers_get_placeholders() {
        let cells = vec![
            CellValue::Text("Plot".to_string()),
            CellValue::Empty,
            CellValue::Empty,
        ];
        assert_eq!(header_names(&cells), vec!["Plot", "__EMPTY", "__EMPTY_1"]);
    }

    #[test]
    fn test_repeated_headers_get_suffixes() {
        let cells = vec![
            CellValue::Text("Yield".to_string()),
            CellValue::Text("Yield".to_string()),
            CellValue::Number(2024.0),
        ];
        assert_eq!(header_names(&cells), vec!["Yield", "Yield_1", "2024"]);
    }
}
