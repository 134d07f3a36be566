use statviz_ingest::{IngestError, export_transformed, write_csv};
use statviz_model::DataRow;

#[test]
fn write_csv_quotes_and_blanks() {
    let rows = vec![
        DataRow::new().with("Variety", "V1, early").with("Yield", 42.0),
        DataRow::new().with("Variety", "V2"),
    ];
    let columns = vec!["Variety".to_string(), "Yield".to_string()];
    let text = write_csv(&rows, &columns).expect("write csv");
    assert_eq!(text, "Variety,Yield\n\"V1, early\",42\nV2,\n");
}

#[test]
fn transformed_export_pairs_rows() {
    let original = vec![
        DataRow::new().with("Yield", 4.0),
        DataRow::new().with("Yield", 9.0),
    ];
    let transformed = vec![
        DataRow::new().with("Yield_sqrt", 2.0),
        DataRow::new().with("Yield_sqrt", 3.0),
    ];
    let text = export_transformed(&original, "Yield", &transformed, "Yield_sqrt").expect("export");
    assert_eq!(text, "Yield,Yield_sqrt\n4,2\n9,3\n");
}

#[test]
fn transformed_export_needs_rows() {
    let err = export_transformed(&[], "Yield", &[], "Yield_log").expect_err("nothing to export");
    assert!(matches!(err, IngestError::NothingToExport));
}
