//! Upload parsing for StatViz: CSV and workbook files become a [`Dataset`].
//!
//! [`Dataset`]: statviz_model::Dataset

pub mod csv_table;
pub mod error;
pub mod export;
pub mod hints;
pub mod upload;
pub mod workbook;

pub use csv_table::{parse_cell, read_csv_bytes, read_csv_path};
pub use error::{IngestError, Result};
pub use export::{export_transformed, pair_transformed, write_csv};
pub use hints::{ColumnHint, build_column_hints, infer_column_kinds};
pub use upload::{
    DEFAULT_SPREADSHEET_LIMIT_BYTES, FileKind, Upload, UploadPolicy, parse_upload,
};
pub use workbook::{excel_serial_to_date, read_workbook, sheet_names};
