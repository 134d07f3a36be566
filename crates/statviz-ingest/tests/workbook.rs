use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use statviz_ingest::{IngestError, read_workbook, sheet_names};
use statviz_model::CellValue;

fn trial_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Plots").expect("name sheet");
    sheet.write_string(0, 0, "Plot").expect("header");
    sheet.write_string(0, 1, "Sown").expect("header");
    sheet.write_string(0, 2, "Yield").expect("header");
    sheet.write_string(1, 0, "P1").expect("cell");
    let sown = ExcelDateTime::from_ymd(2024, 3, 15).expect("date");
    sheet
        .write_datetime_with_format(1, 1, &sown, &date_format)
        .expect("date cell");
    sheet.write_number(1, 2, 42.0).expect("cell");
    // row 2 left blank
    sheet.write_string(3, 0, "P2").expect("cell");
    sheet.write_number(3, 2, 38.5).expect("cell");

    let notes = workbook.add_worksheet();
    notes.set_name("Notes").expect("name sheet");
    notes.write_string(0, 0, "Remark").expect("header");
    notes.write_string(1, 0, "dry season").expect("cell");

    workbook.save_to_buffer().expect("save workbook")
}

#[test]
fn lists_sheets_in_order() {
    let bytes = trial_workbook();
    assert_eq!(
        sheet_names("trial.xlsx", &bytes).expect("sheet names"),
        vec!["Plots", "Notes"]
    );
}

#[test]
fn first_sheet_is_read_by_default() {
    let bytes = trial_workbook();
    let dataset = read_workbook("trial.xlsx", &bytes, None).expect("read workbook");

    assert_eq!(dataset.column_names(), vec!["Plot", "Sown", "Yield"]);
    assert_eq!(dataset.rows.len(), 2);
    let first = &dataset.rows[0];
    assert_eq!(first.get("Sown"), Some(&CellValue::Text("2024-03-15".to_string())));
    assert_eq!(first.get("Yield"), Some(&CellValue::Number(42.0)));
    assert_eq!(dataset.rows[1].get("Sown"), Some(&CellValue::Empty));
}

#[test]
fn named_sheet_is_read() {
    let bytes = trial_workbook();
    let dataset = read_workbook("trial.xlsx", &bytes, Some("Notes")).expect("read sheet");
    assert_eq!(dataset.column_names(), vec!["Remark"]);
    assert_eq!(
        dataset.rows[0].get("Remark"),
        Some(&CellValue::Text("dry season".to_string()))
    );
}

#[test]
fn missing_sheet_names_the_sheet() {
    let bytes = trial_workbook();
    let err = read_workbook("trial.xlsx", &bytes, Some("Harvest")).expect_err("missing sheet");
    assert!(matches!(err, IngestError::SheetNotFound { .. }));
    assert!(err.to_string().contains("Harvest"));
}

#[test]
fn corrupt_workbook_is_unreadable() {
    let err = read_workbook("broken.xlsx", b"definitely not a zip archive", None)
        .expect_err("corrupt workbook");
    assert!(matches!(err, IngestError::Unreadable { .. }));
}
