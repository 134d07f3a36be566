//! Column kind inference and per-column statistics.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use statviz_model::{CellValue, ColumnKind, Dataset};

/// Per-column profile used for display and role suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnHint {
    pub is_numeric: bool,
    pub unique_ratio: f64,
    pub null_ratio: f64,
}

impl ColumnHint {
    pub fn kind(&self) -> ColumnKind {
        if self.is_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

pub fn build_column_hints(dataset: &Dataset) -> BTreeMap<String, ColumnHint> {
    let mut hints = BTreeMap::new();
    let row_count = dataset.rows.len();
    for column in &dataset.columns {
        let mut non_null = 0usize;
        let mut numeric = 0usize;
        let mut uniques = BTreeSet::new();
        for value in dataset.column_values(&column.name) {
            if value.is_blank() {
                continue;
            }
            non_null += 1;
            uniques.insert(value.to_string());
            if matches!(value, CellValue::Number(_)) {
                numeric += 1;
            }
        }
        let null_ratio = if row_count == 0 {
            1.0
        } else {
            (row_count.saturating_sub(non_null)) as f64 / row_count as f64
        };
        let unique_ratio = if non_null == 0 {
            0.0
        } else {
            uniques.len() as f64 / non_null as f64
        };
        hints.insert(
            column.name.clone(),
            ColumnHint {
                is_numeric: non_null > 0 && numeric == non_null,
                unique_ratio,
                null_ratio,
            },
        );
    }
    hints
}

/// Tag every column numeric when all its non-empty values are numbers.
pub fn infer_column_kinds(dataset: &mut Dataset) {
    let hints = build_column_hints(dataset);
    for column in &mut dataset.columns {
        column.kind = hints.get(&column.name).map(ColumnHint::kind);
    }
}
