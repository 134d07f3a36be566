use serde_json::json;

use statviz_model::{
    AnalysisResult, AnalysisType, CellValue, ColumnDefinition, ColumnKind, DataRow,
    VariableMapping, VariableRole,
};

#[test]
fn data_row_serializes_as_ordered_object() {
    let row = DataRow::new()
        .with("Plot", "P1")
        .with("Yield", 42.5)
        .with("Irrigated", true)
        .with("Notes", CellValue::Empty);
    let json = serde_json::to_string(&row).expect("serialize row");
    assert_eq!(
        json,
        r#"{"Plot":"P1","Yield":42.5,"Irrigated":true,"Notes":null}"#
    );

    let back: DataRow = serde_json::from_str(&json).expect("deserialize row");
    assert_eq!(back, row);
}

#[test]
fn column_kind_uses_type_key() {
    let mut column = ColumnDefinition::new("Yield");
    column.kind = Some(ColumnKind::Numeric);
    let value = serde_json::to_value(&column).expect("serialize column");
    assert_eq!(value, json!({"id": "Yield", "name": "Yield", "type": "numeric"}));
}

#[test]
fn mapping_uses_camel_case_wire_names() {
    let mapping = VariableMapping {
        dependent_variable: Some("Yield".to_string()),
        independent_variables: vec!["Variety".to_string()],
        values_column: None,
        covariates: vec![],
    };
    let value = serde_json::to_value(&mapping).expect("serialize mapping");
    assert_eq!(
        value,
        json!({
            "dependentVariable": "Yield",
            "independentVariables": ["Variety"],
            "valuesColumn": null,
            "covariates": []
        })
    );
    assert!(mapping.is_ready());
    assert_eq!(mapping.role_of("Variety"), Some(VariableRole::Independent));
    assert_eq!(mapping.role_of("Block"), None);
}

#[test]
fn mapping_without_covariates_key_deserializes() {
    let mapping: VariableMapping = serde_json::from_value(json!({
        "dependentVariable": null,
        "independentVariables": [],
        "valuesColumn": null
    }))
    .expect("deserialize mapping");
    assert!(mapping.covariates.is_empty());
    assert!(!mapping.is_ready());
}

#[test]
fn backend_bag_is_classified_by_shape() {
    let anova: AnalysisResult = serde_json::from_value(json!({
        "title": "ANOVA Results",
        "summaryTable": {"headers": ["Source", "F"], "rows": [["Between Groups", 4.2]]},
        "statistics": {"p-value": 0.03}
    }))
    .expect("anova");
    assert!(matches!(anova, AnalysisResult::Anova(_)));
    assert_eq!(anova.statistics().len(), 1);

    let post_hoc: AnalysisResult = serde_json::from_value(json!({
        "title": "Tukey",
        "postHocTests": {"testName": "Tukey's HSD", "results": [{
            "comparison": "A-B", "diff": 1.0, "lower": 0.1, "upper": 1.9,
            "pValue": 0.02, "significant": true
        }]}
    }))
    .expect("post hoc");
    assert!(matches!(post_hoc, AnalysisResult::PostHoc(_)));

    let raw: AnalysisResult =
        serde_json::from_value(json!({"title": "Notes", "rawOutput": "ok"})).expect("raw");
    assert!(matches!(raw, AnalysisResult::Raw(_)));
    assert!(raw.summary_table().is_none());
}

#[test]
fn error_result_round_trips_through_wire_form() {
    let result = AnalysisResult::failure(AnalysisType::Ancova, "unreachable", "timeout");
    let value = serde_json::to_value(&result).expect("serialize");
    assert_eq!(value["title"], "Error: ANCOVA Failed");
    assert_eq!(value["summaryTable"]["headers"], json!(["Error"]));
    let back: AnalysisResult = serde_json::from_value(value).expect("deserialize");
    assert!(back.is_error());
}
