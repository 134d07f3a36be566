use statviz_ingest::{
    DEFAULT_SPREADSHEET_LIMIT_BYTES, IngestError, Upload, UploadPolicy, parse_upload,
};

#[test]
fn oversized_spreadsheet_is_rejected_before_parsing() {
    // Not a workbook: a parse attempt would fail with Unreadable instead.
    let bytes = vec![b'x'; DEFAULT_SPREADSHEET_LIMIT_BYTES as usize + 1];
    let mut upload = Upload::from_bytes("big.xlsx", bytes);
    let policy = UploadPolicy::with_spreadsheet_limit(DEFAULT_SPREADSHEET_LIMIT_BYTES);

    let err = parse_upload(&mut upload, &policy, None).expect_err("too large");
    match err {
        IngestError::TooLarge { size, limit } => {
            assert_eq!(limit, DEFAULT_SPREADSHEET_LIMIT_BYTES);
            assert_eq!(size, DEFAULT_SPREADSHEET_LIMIT_BYTES + 1);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
    assert!(upload.is_cleared());
}

#[test]
fn size_limit_does_not_apply_to_csv() {
    let mut body = String::from("value\n");
    while body.len() as u64 <= DEFAULT_SPREADSHEET_LIMIT_BYTES {
        body.push_str("1234567\n");
    }
    let mut upload = Upload::from_bytes("big.csv", body.into_bytes());
    let policy = UploadPolicy::with_spreadsheet_limit(DEFAULT_SPREADSHEET_LIMIT_BYTES);

    let dataset = parse_upload(&mut upload, &policy, None).expect("csv is not limited");
    assert!(!dataset.rows.is_empty());
    assert!(!upload.is_cleared());
}

#[test]
fn corrupt_spreadsheet_clears_the_upload() {
    let mut upload = Upload::from_bytes("broken.xlsx", b"garbage".to_vec());
    let err = parse_upload(&mut upload, &UploadPolicy::unlimited(), None).expect_err("corrupt");
    assert!(matches!(err, IngestError::Unreadable { .. }));
    assert!(upload.is_cleared());
}
