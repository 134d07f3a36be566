use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use statviz_analysis::{
    AnalysisError, BlupRequest, DesignClient, FrbdRequest, LmmRequest, MixedModelClient,
    NonParametricClient, NonParametricTest, ProbitClient, RbdRequest, SpatialClient,
    SpatialColumns, SurvivalClient, TransformClient, UploadFile,
};
use statviz_model::DataRow;

const TIMEOUT: Duration = Duration::from_secs(5);

fn trial_rows() -> Vec<DataRow> {
    vec![
        DataRow::new()
            .with("Block", "B1")
            .with("Variety", "V1")
            .with("Nitrogen", "N0")
            .with("Yield", 42.0),
        DataRow::new()
            .with("Block", "B1")
            .with("Variety", "V2")
            .with("Nitrogen", "N1")
            .with("Yield", 39.0),
    ]
}

fn spatial_columns() -> SpatialColumns {
    SpatialColumns {
        location: "Site".to_string(),
        value: "Yield".to_string(),
        latitude: None,
        longitude: None,
    }
}

#[test]
fn spatial_posts_renamed_rows() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/spatial").json_body(json!({
            "data": [{"LOCATION": "Pune, Maharashtra", "Value": 12.5}]
        }));
        then.status(200).json_body(json!({
            "moran_i": {"I": 0.42, "p_value": 0.01},
            "plots": {"morans_scatterplot": "iVBORw0KGgo="},
            "interactive_map": "<div>map</div>"
        }));
    });

    let client =
        SpatialClient::new(Some(server.url("/spatial/").as_str()), TIMEOUT).expect("client");
    let rows = vec![
        DataRow::new()
            .with("Site", "Pune, Maharashtra")
            .with("Yield", 12.5),
    ];
    let result = client.analyze(&rows, &spatial_columns()).expect("spatial result");

    mock.assert();
    let moran = result.moran_i.expect("moran");
    assert!((moran.i - 0.42).abs() < 1e-12);
    assert_eq!(result.plots.expect("plots").len(), 1);
    assert!(result.interactive_map.is_some());
}

#[test]
fn spatial_without_url_is_not_configured() {
    let client = SpatialClient::new(None, TIMEOUT).expect("client");
    let err = client
        .analyze(&[], &spatial_columns())
        .expect_err("no url configured");
    assert_eq!(err.to_string(), "Spatial service URL is not configured");
}

#[test]
fn spatial_html_error_quotes_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/spatial");
        then.status(502).body("<html>Bad Gateway</html>");
    });
    let client =
        SpatialClient::new(Some(server.url("/spatial").as_str()), TIMEOUT).expect("client");
    let err = client.analyze(&[], &spatial_columns()).expect_err("html body");
    assert!(matches!(err, AnalysisError::UnexpectedResponse { status: 502, .. }));
    assert!(err.to_string().contains("<html>Bad Gateway</html>"));
}

#[test]
fn spatial_json_error_uses_error_field() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/spatial");
        then.status(400)
            .json_body(json!({"error": "Could not geocode any location"}));
    });
    let client =
        SpatialClient::new(Some(server.url("/spatial").as_str()), TIMEOUT).expect("client");
    let err = client.analyze(&[], &spatial_columns()).expect_err("service error");
    assert_eq!(err.user_message(), "Could not geocode any location");
}

#[test]
fn rbd_returns_design_result() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/rbd");
        then.status(200).json_body(json!({
            "anova_table": "{\"PR(>F)\": {\"C(Q('Variety'))\": 0.002}}",
            "shapiro": {"stat": 0.97, "p": 0.61},
            "overall_cv": 7.25,
            "cd_value": 1.8342
        }));
    });

    let client =
        DesignClient::new(Some(server.url("/rbd").as_str()), None, TIMEOUT).expect("client");
    let request = RbdRequest {
        block_col: "Block".to_string(),
        factor_col: "Variety".to_string(),
        response_col: "Yield".to_string(),
    };
    let result = client.rbd(&trial_rows(), &request).expect("rbd result");

    mock.assert();
    assert_eq!(result.overall_cv(), Some(7.25));
    assert_eq!(result.shapiro().map(|s| s.p), Some(0.61));
    assert_eq!(result.anova_significance().get("Variety"), Some(&true));
}

#[test]
fn frbd_needs_two_factors() {
    let client = DesignClient::new(None, Some("http://127.0.0.1:9/frbd"), TIMEOUT).expect("client");
    let request = FrbdRequest {
        block_col: "Block".to_string(),
        factor_cols: vec!["Variety".to_string()],
        response_col: "Yield".to_string(),
    };
    let err = client.frbd(&trial_rows(), &request).expect_err("one factor");
    assert!(matches!(err, AnalysisError::InvalidRequest(_)));
}

#[test]
fn frbd_error_status_surfaces_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/frbd");
        then.status(422).json_body(json!({"error": "Response column must be numeric"}));
    });
    let client =
        DesignClient::new(None, Some(server.url("/frbd").as_str()), TIMEOUT).expect("client");
    let request = FrbdRequest {
        block_col: "Block".to_string(),
        factor_cols: vec!["Variety".to_string(), "Nitrogen".to_string()],
        response_col: "Yield".to_string(),
    };
    let err = client.frbd(&trial_rows(), &request).expect_err("service error");
    assert_eq!(err.user_message(), "Response column must be numeric");
}

#[test]
fn transform_analyze_and_apply() {
    let server = MockServer::start();
    let analyze = server.mock(|when, then| {
        when.method(POST).path("/analyze").json_body(json!({
            "data": [{"Yield": 4.0}, {"Yield": 9.0}],
            "response_col": "Yield"
        }));
        then.status(200).json_body(json!({
            "original_normality": {
                "shapiro_wilk": {"interpretation": "Not normal"},
                "descriptive_stats": {"skewness_interpretation": "Right skewed"}
            },
            "recommendation": "Square Root",
            "score": 0.91
        }));
    });
    let apply = server.mock(|when, then| {
        when.method(POST).path("/apply").json_body(json!({
            "data": [{"Yield": 4.0}, {"Yield": 9.0}],
            "response_col": "Yield",
            "transform_choice": "Square Root"
        }));
        then.status(200).json_body(json!({
            "transformed_data": "[{\"Yield\": 4.0, \"Yield_sqrt\": 2.0}, {\"Yield\": 9.0, \"Yield_sqrt\": 3.0}]",
            "transformed_response_col": "Yield_sqrt"
        }));
    });

    let client = TransformClient::new(
        Some(server.url("/analyze").as_str()),
        Some(server.url("/apply").as_str()),
        TIMEOUT,
    )
    .expect("client");
    let rows = vec![DataRow::new().with("Yield", 4.0), DataRow::new().with("Yield", 9.0)];

    let report = client.analyze(&rows, "Yield").expect("report");
    analyze.assert();
    assert_eq!(report.recommended_transform(), Some("Square Root"));
    assert_eq!(report.summary().skewness, "Right skewed");
    assert_eq!(report.summary().dagostino_pearson, "-");

    let payload = client.apply(&rows, "Yield", "Square Root").expect("payload");
    apply.assert();
    assert_eq!(payload.transformed_response_col, "Yield_sqrt");
    let transformed = payload.transformed_rows().expect("rows");
    assert_eq!(transformed[1].get("Yield_sqrt").and_then(|v| v.as_f64()), Some(3.0));
}

fn blup_request() -> BlupRequest {
    BlupRequest {
        dependent_var: "Yield".to_string(),
        genotype_var: "Variety".to_string(),
        rep_var: "Rep".to_string(),
        block_var: "Block".to_string(),
        env_var: "Location".to_string(),
        year_var: "Year".to_string(),
    }
}

#[test]
fn nonparametric_sends_test_key_and_file() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/nonp/analyze")
            .body_includes("kruskal_wallis")
            .body_includes("filename=\"groups.csv\"")
            .body_includes("12,15,11");
        then.status(200)
            .json_body(json!({"test": "Kruskal-Wallis", "statistic": 7.2, "p_value": 0.027}));
    });

    let client = NonParametricClient::new(Some(server.url("/nonp/analyze").as_str()), TIMEOUT)
        .expect("client");
    let file = UploadFile::new("groups.csv", b"A,B,C\n12,15,11\n".to_vec());
    let result = client
        .analyze(NonParametricTest::KruskalWallis, &file)
        .expect("result");

    mock.assert_calls(1);
    assert_eq!(result["p_value"], json!(0.027));
}

#[test]
fn nonparametric_error_without_message_uses_fallback() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/nonp/analyze");
        then.status(500).json_body(json!({}));
    });
    let client = NonParametricClient::new(Some(server.url("/nonp/analyze").as_str()), TIMEOUT)
        .expect("client");
    let file = UploadFile::new("groups.csv", b"A,B\n1,2\n".to_vec());
    let err = client
        .analyze(NonParametricTest::MannWhitneyU, &file)
        .expect_err("service error");
    assert_eq!(err.user_message(), "Backend analysis failed.");
}

#[test]
fn lmm_sends_effects_form() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/lmm")
            .body_includes("effects")
            .body_includes("Variety,Nitrogen")
            .body_includes("\"Yield\":42.0");
        then.status(200).json_body(json!({"fixed_effects": [], "random_effects": []}));
    });

    let client =
        MixedModelClient::new(Some(server.url("/lmm").as_str()), None, TIMEOUT).expect("client");
    let request = LmmRequest {
        response_col: "Yield".to_string(),
        group_col: "Block".to_string(),
        fixed_effects: vec!["Variety".to_string(), "Nitrogen".to_string()],
        tukey_factor: "Variety".to_string(),
    };
    let result = client.lmm(&trial_rows(), &request).expect("lmm result");

    mock.assert_calls(1);
    assert!(result.get("random_effects").is_some());
}

#[test]
fn lmm_error_uses_error_field() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/lmm");
        then.status(400).json_body(json!({"error": "Singular fit"}));
    });
    let client =
        MixedModelClient::new(Some(server.url("/lmm").as_str()), None, TIMEOUT).expect("client");
    let request = LmmRequest {
        response_col: "Yield".to_string(),
        group_col: "Block".to_string(),
        fixed_effects: vec!["Variety".to_string()],
        tukey_factor: "Variety".to_string(),
    };
    let err = client.lmm(&trial_rows(), &request).expect_err("service error");
    assert_eq!(err.user_message(), "Singular fit");
}

#[test]
fn blup_posts_mapping_fields() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/blup")
            .body_includes("genotype_var")
            .body_includes("Location")
            .body_includes("year_var");
        then.status(200).json_body(json!({"blups": [{"Variety": "V1", "BLUP": 1.2}]}));
    });

    let client =
        MixedModelClient::new(None, Some(server.url("/blup").as_str()), TIMEOUT).expect("client");
    let result = client
        .blup(&trial_rows(), &blup_request())
        .expect("blup result");

    mock.assert_calls(1);
    assert_eq!(result["blups"][0]["BLUP"], json!(1.2));
}

#[test]
fn blup_failures_report_body_text_or_error_field() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/blup/text");
        then.status(500).body("R process crashed");
    });
    server.mock(|when, then| {
        when.method(POST).path("/blup/empty");
        then.status(503);
    });
    server.mock(|when, then| {
        when.method(POST).path("/blup/field");
        then.status(200).json_body(json!({"error": "Too few environments"}));
    });

    let message = |path: &str| {
        MixedModelClient::new(None, Some(server.url(path).as_str()), TIMEOUT)
            .expect("client")
            .blup(&trial_rows(), &blup_request())
            .expect_err("blup error")
            .user_message()
    };
    assert_eq!(message("/blup/text"), "R process crashed");
    assert_eq!(message("/blup/empty"), "Analysis failed (503)");
    assert_eq!(message("/blup/field"), "Too few environments");
}

#[test]
fn blup_rejects_genotype_as_replication_before_posting() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/blup");
        then.status(200).json_body(json!({}));
    });
    let client =
        MixedModelClient::new(None, Some(server.url("/blup").as_str()), TIMEOUT).expect("client");
    let request = BlupRequest {
        rep_var: "Variety".to_string(),
        ..blup_request()
    };

    let err = client.blup(&trial_rows(), &request).expect_err("same column");

    mock.assert_calls(0);
    assert!(matches!(err, AnalysisError::InvalidRequest(_)));
}

#[test]
fn survival_sends_file_and_each_covariate() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/survival")
            .body_includes("filename=\"upload.csv\"")
            .body_includes("covariates")
            .body_includes("Dosage")
            .body_includes("Temperature");
        then.status(200).json_body(json!({"median_survival": 14.0}));
    });

    let client =
        SurvivalClient::new(Some(server.url("/survival").as_str()), TIMEOUT).expect("client");
    let file = UploadFile::converted_sheet("Time,Event,Dosage,Temperature\n3,1,5,20\n".to_string());
    let covariates = vec!["Dosage".to_string(), "Temperature".to_string()];
    let result = client.analyze(&file, &covariates).expect("survival result");

    mock.assert_calls(1);
    assert_eq!(result["median_survival"], json!(14.0));
}

#[test]
fn unconfigured_survival_service() {
    let client = SurvivalClient::new(None, TIMEOUT).expect("client");
    let file = UploadFile::new("s.csv", b"Time,Event\n1,0\n".to_vec());
    let err = client.analyze(&file, &[]).expect_err("no url");
    assert!(matches!(err, AnalysisError::ServiceNotConfigured { service: "survival" }));
}

#[test]
fn probit_reads_both_methods() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/probit").body_includes("filename=\"dose.csv\"");
        then.status(200).json_body(json!({
            "finney": {"LC50": 2.4},
            "profile_likelihood": {"LC50": 2.5}
        }));
    });

    let client = ProbitClient::new(Some(server.url("/probit").as_str()), TIMEOUT).expect("client");
    let file = UploadFile::new("dose.csv", b"Dose,Total,Dead\n1,20,2\n".to_vec());
    let result = client.analyze(&file).expect("probit result");

    mock.assert_calls(1);
    assert_eq!(result.finney, json!({"LC50": 2.4}));
    assert_eq!(result.profile_likelihood, Some(json!({"LC50": 2.5})));
}

#[test]
fn probit_single_method_body_becomes_finney() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/probit");
        then.status(200).json_body(json!({"LC50": 2.4, "slope": 1.7}));
    });
    let client = ProbitClient::new(Some(server.url("/probit").as_str()), TIMEOUT).expect("client");
    let file = UploadFile::new("dose.csv", b"Dose,Total,Dead\n1,20,2\n".to_vec());
    let result = client.analyze(&file).expect("probit result");
    assert_eq!(result.finney, json!({"LC50": 2.4, "slope": 1.7}));
    assert_eq!(result.profile_likelihood, None);
}
