//! CSV export of rows.

use csv::Writer;

use statviz_model::{CellValue, DataRow};

use crate::error::{IngestError, Result};

/// Serialize rows to CSV text with `columns` as the header.
pub fn write_csv(rows: &[DataRow], columns: &[String]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(columns).map_err(export_error)?;
    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).map(ToString::to_string).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(export_error)?;
    }
    let bytes = writer.into_inner().map_err(|err| IngestError::Export {
        message: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| IngestError::Export {
        message: err.to_string(),
    })
}

/// Pair original and transformed values row by row.
///
/// Rows are taken from `transformed_rows`; a missing original row yields an
/// empty cell.
pub fn pair_transformed(
    original_rows: &[DataRow],
    original_col: &str,
    transformed_rows: &[DataRow],
    transformed_col: &str,
) -> Vec<DataRow> {
    transformed_rows
        .iter()
        .enumerate()
        .map(|(idx, transformed)| {
            let original = original_rows
                .get(idx)
                .and_then(|row| row.get(original_col))
                .cloned()
                .unwrap_or(CellValue::Empty);
            let value = transformed
                .get(transformed_col)
                .cloned()
                .unwrap_or(CellValue::Empty);
            let mut row = DataRow::new();
            row.insert(original_col, original);
            row.insert(transformed_col, value);
            row
        })
        .collect()
}

/// CSV body for the `transformed_data.csv` download.
pub fn export_transformed(
    original_rows: &[DataRow],
    original_col: &str,
    transformed_rows: &[DataRow],
    transformed_col: &str,
) -> Result<String> {
    if transformed_rows.is_empty() {
        return Err(IngestError::NothingToExport);
    }
    let rows = pair_transformed(original_rows, original_col, transformed_rows, transformed_col);
    write_csv(&rows, &[original_col.to_string(), transformed_col.to_string()])
}

fn export_error(err: csv::Error) -> IngestError {
    IngestError::Export {
        message: err.to_string(),
    }
}
