use std::path::Path;
use std::sync::{Arc, Mutex};

use httpmock::prelude::*;
use rust_xlsxwriter::Workbook;
use serde_json::json;
use statviz_assist::{Assistant, GenerationRequest, TextGenerator};
use statviz_cli::cli::{
    AnalyzeArgs, BlupArgs, DescribeArgs, DesignArg, ExplainArgs, FileArgs, FrbdArgs, GroupsArg,
    NonParametricArgs, PreviewArgs, ProbitArgs, RbdArgs, ScaleArg, SurvivalArgs,
};
use statviz_cli::commands::{
    run_analyze, run_blup, run_config, run_describe, run_explain, run_frbd, run_nonparametric,
    run_preview, run_probit, run_rbd, run_survival,
};
use statviz_core::{BackendMode, ServiceConfig, ServiceRegistry};
use statviz_ingest::UploadPolicy;
use statviz_model::{AnalysisResult, AnalysisType};

const TRIAL_CSV: &str = "Plot,Block,Variety,Yield\n\
P1,1,A,4.2\n\
P2,1,B,5.1\n\
P3,2,A,4.4\n\
P4,2,B,5.6\n\
P5,3,A,3.9\n\
P6,3,B,5.3\n";

#[derive(Clone, Default)]
struct RecordingGenerator {
    prompts: Arc<Mutex<Vec<String>>>,
}

impl TextGenerator for RecordingGenerator {
    fn generate(&self, request: &GenerationRequest) -> statviz_assist::Result<String> {
        self.prompts
            .lock()
            .expect("lock")
            .push(request.prompt.clone());
        Ok("The varieties differ.".to_string())
    }
}

fn mock_registry() -> ServiceRegistry {
    let mut config = ServiceConfig::default();
    config.backend.mode = BackendMode::Mock;
    ServiceRegistry::from_config(config).expect("registry")
}

fn write_trial(dir: &Path) -> FileArgs {
    let file = dir.join("trial.csv");
    std::fs::write(&file, TRIAL_CSV).expect("write csv");
    FileArgs { file, sheet: None }
}

fn analyze_args(input: FileArgs, analysis_type: AnalysisType) -> AnalyzeArgs {
    AnalyzeArgs {
        input,
        analysis_type,
        dependent: "Yield".to_string(),
        independent: vec!["Variety".to_string()],
        values: None,
        covariates: vec![],
        explain: false,
        context: None,
        json: false,
    }
}

#[test]
fn preview_reports_shape_and_kinds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = PreviewArgs {
        input: write_trial(dir.path()),
        rows: 3,
    };
    let output = run_preview(&args, &UploadPolicy::default()).expect("preview");
    assert!(output.starts_with("trial.csv (6 rows, 4 columns)"));
    assert!(output.contains("numeric"));
    assert!(output.contains("categorical"));
    assert!(output.contains("P3"));
    assert!(!output.contains("P4"));
}

#[test]
fn describe_defaults_to_numeric_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = DescribeArgs {
        input: write_trial(dir.path()),
        columns: vec![],
        group: Some("Variety".to_string()),
    };
    let output = run_describe(&args, &UploadPolicy::default()).expect("describe");
    assert!(output.contains("Yield"));
    assert!(output.contains("Levene by Variety"));
    assert!(!output.contains("Plot "));
}

#[test]
fn describe_suggests_close_column_names() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = DescribeArgs {
        input: write_trial(dir.path()),
        columns: vec!["yeild".to_string()],
        group: None,
    };
    let err = run_describe(&args, &UploadPolicy::default()).expect_err("missing column");
    assert_eq!(err.to_string(), "column 'yeild' not found (did you mean 'Yield'?)");
}

#[test]
fn analyze_walks_the_wizard_on_the_mock_backend() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = mock_registry();
    let args = analyze_args(write_trial(dir.path()), AnalysisType::Anova);
    let output = run_analyze(&registry, &args).expect("analyze");
    assert_eq!(output.result.title(), "One-Way ANOVA Results");
    assert!(!output.result.is_error());
    assert!(output.rendered.contains("Between Groups"));
}

#[test]
fn analyze_json_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = mock_registry();
    let mut args = analyze_args(write_trial(dir.path()), AnalysisType::TukeyHsd);
    args.json = true;
    let output = run_analyze(&registry, &args).expect("analyze");
    let parsed: AnalysisResult = serde_json::from_str(&output.rendered).expect("json output");
    assert_eq!(parsed, output.result);
    assert!(matches!(parsed, AnalysisResult::PostHoc(_)));
}

#[test]
fn analyze_rejects_unknown_dependent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = mock_registry();
    let mut args = analyze_args(write_trial(dir.path()), AnalysisType::Anova);
    args.dependent = "Height".to_string();
    let err = run_analyze(&registry, &args).err().expect("unknown column");
    assert!(err.to_string().contains("column 'Height' not found"));
}

#[test]
fn analyze_explain_without_key_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = mock_registry();
    let mut args = analyze_args(write_trial(dir.path()), AnalysisType::Anova);
    args.explain = true;
    let err = run_analyze(&registry, &args).err().expect("no assistant");
    assert!(err.to_string().contains("no API key configured"));
}

#[test]
fn analyze_explain_appends_the_explanation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let generator = RecordingGenerator::default();
    let registry =
        mock_registry().with_assistant(Assistant::new(Box::new(generator.clone())));
    let mut args = analyze_args(write_trial(dir.path()), AnalysisType::Anova);
    args.explain = true;
    args.context = Some("wheat variety trial".to_string());
    let output = run_analyze(&registry, &args).expect("analyze");
    assert!(output.rendered.ends_with("AI Explanation\nThe varieties differ."));

    let prompts = generator.prompts.lock().expect("lock");
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("ANOVA"));
    assert!(prompts[0].contains("User context: wheat variety trial"));
}

#[test]
fn explain_accepts_saved_json_and_plain_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let generator = RecordingGenerator::default();
    let registry =
        mock_registry().with_assistant(Assistant::new(Box::new(generator.clone())));

    let saved = dir.path().join("result.json");
    let result = AnalysisResult::failure(AnalysisType::Anova, "backend down", "HTTP 502");
    std::fs::write(&saved, serde_json::to_string(&result).expect("json")).expect("write");
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "F = 8.42, p = 0.0012").expect("write");

    for results in [saved, notes] {
        let args = ExplainArgs {
            results,
            analysis_type: AnalysisType::Anova,
            context: None,
        };
        let explanation = run_explain(&registry, &args).expect("explain");
        assert_eq!(explanation, "The varieties differ.");
    }

    let prompts = generator.prompts.lock().expect("lock");
    assert!(prompts[0].contains("Analysis Title: Error: ANOVA Failed"));
    assert!(prompts[1].contains("F = 8.42, p = 0.0012"));
}

#[test]
fn rbd_without_service_url_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = mock_registry();
    let args = RbdArgs {
        input: write_trial(dir.path()),
        block: "Block".to_string(),
        factor: "Variety".to_string(),
        response: "Yield".to_string(),
        summary: false,
    };
    let err = run_rbd(&registry, &args).expect_err("not configured");
    assert_eq!(err.to_string(), "RBD service URL is not configured");
}

#[test]
fn frbd_needs_two_factors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = mock_registry();
    let args = FrbdArgs {
        input: write_trial(dir.path()),
        block: "Block".to_string(),
        factors: vec!["Variety".to_string()],
        response: "Yield".to_string(),
        summary: false,
    };
    let err = run_frbd(&registry, &args).expect_err("one factor");
    assert!(err.to_string().contains("at least two --factor columns"));
}

#[test]
fn config_output_masks_the_key() {
    let mut config = ServiceConfig::default();
    config.llm.api_key = Some("AIzaSyExampleKey1234".to_string());
    let output = run_config(&config).expect("config");
    assert!(output.contains("****1234"));
    assert!(!output.contains("AIzaSyExampleKey1234"));
}

fn registry_with(configure: impl FnOnce(&mut ServiceConfig)) -> ServiceRegistry {
    let mut config = ServiceConfig::default();
    config.backend.mode = BackendMode::Mock;
    configure(&mut config);
    ServiceRegistry::from_config(config).expect("registry")
}

fn write_survival_workbook(dir: &Path) -> FileArgs {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Mortality").expect("name sheet");
    for (col, header) in ["Time", "Event", "Dosage"].into_iter().enumerate() {
        sheet.write_string(0, col as u16, header).expect("header");
    }
    for (row, values) in [[3.0, 1.0, 5.0], [7.0, 0.0, 10.0]].into_iter().enumerate() {
        for (col, value) in values.into_iter().enumerate() {
            sheet
                .write_number(row as u32 + 1, col as u16, value)
                .expect("cell");
        }
    }
    let file = dir.join("mortality.xlsx");
    workbook.save(&file).expect("save workbook");
    FileArgs {
        file,
        sheet: Some("Mortality".to_string()),
    }
}

#[test]
fn nonparametric_recommends_and_uploads_the_csv() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/nonp/analyze")
            .body_includes("mann_whitney_u")
            .body_includes("filename=\"trial.csv\"");
        then.status(200).json_body(json!({"statistic": 0.0, "p_value": 0.1}));
    });
    let registry = registry_with(|config| {
        config.services.nonparametric_url = Some(server.url("/nonp/analyze"));
    });
    let dir = tempfile::tempdir().expect("tempdir");
    let args = NonParametricArgs {
        input: write_trial(dir.path()),
        test: None,
        groups: Some(GroupsArg::Two),
        design: DesignArg::Independent,
        scale: Some(ScaleArg::Ordinal),
    };

    let output = run_nonparametric(&registry, &args).expect("nonparametric");

    mock.assert_calls(1);
    assert!(output.starts_with("Test: Mann-Whitney U test\n"));
    assert!(output.contains("\"p_value\": 0.1"));
}

#[test]
fn nonparametric_without_matching_test() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = NonParametricArgs {
        input: write_trial(dir.path()),
        test: None,
        groups: Some(GroupsArg::More),
        design: DesignArg::Paired,
        scale: Some(ScaleArg::Nominal),
    };
    let err = run_nonparametric(&mock_registry(), &args).expect_err("no test");
    assert_eq!(err.to_string(), "No suitable test found for the selected combination.");
}

#[test]
fn survival_converts_the_sheet_to_csv() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/survival")
            .body_includes("filename=\"upload.csv\"")
            .body_includes("Time,Event,Dosage")
            .body_includes("Dosage");
        then.status(200).json_body(json!({"median_survival": 7.0}));
    });
    let registry = registry_with(|config| {
        config.services.survival_url = Some(server.url("/survival"));
    });
    let dir = tempfile::tempdir().expect("tempdir");
    let args = SurvivalArgs {
        input: write_survival_workbook(dir.path()),
        covariates: vec!["Dosage".to_string()],
    };

    let output = run_survival(&registry, &args).expect("survival");

    mock.assert_calls(1);
    assert!(output.starts_with("Survival Analysis Results\n"));
    assert!(output.contains("\"median_survival\": 7.0"));
}

#[test]
fn survival_checks_covariates_exist() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = SurvivalArgs {
        input: write_survival_workbook(dir.path()),
        covariates: vec!["Dose".to_string()],
    };
    let err = run_survival(&mock_registry(), &args).expect_err("unknown covariate");
    assert!(err.to_string().starts_with("column 'Dose' not found"));
}

#[test]
fn blup_rejects_genotype_as_replication() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = BlupArgs {
        input: write_trial(dir.path()),
        dependent: "Yield".to_string(),
        genotype: "Variety".to_string(),
        rep: "Variety".to_string(),
        block: "Block".to_string(),
        environment: "Plot".to_string(),
        year: "Plot".to_string(),
    };
    let err = run_blup(&mock_registry(), &args).expect_err("same column");
    assert!(
        err.to_string()
            .contains("Genotype and Replication columns cannot be the same.")
    );
}

#[test]
fn probit_without_configured_service() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = ProbitArgs {
        input: write_trial(dir.path()),
    };
    let err = run_probit(&mock_registry(), &args).expect_err("no url");
    assert_eq!(err.to_string(), "probit service URL is not configured");
}
