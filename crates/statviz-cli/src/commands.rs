use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, info_span, warn};

use statviz_analysis::{
    BlupRequest, FrbdRequest, LmmRequest, RbdRequest, SpatialColumns, UploadFile, describe,
    histogram, interpret_moran, ks_normality, levene_by_column, recommend_test,
};
use statviz_core::{ServiceConfig, ServiceRegistry, Wizard, WizardStep};
use statviz_ingest::{
    FileKind, Upload, UploadPolicy, build_column_hints, export_transformed, infer_column_kinds,
    parse_upload, sheet_names, write_csv,
};
use statviz_map::{MappingError, suggest_column};
use statviz_model::{AnalysisResult, Dataset, VariableRole};

use crate::cli::{
    AnalyzeArgs, BlupArgs, DescribeArgs, ExplainArgs, FileArgs, FrbdArgs, LmmArgs,
    NonParametricArgs, PreviewArgs, ProbitArgs, RbdArgs, SpatialArgs, SurvivalArgs,
    TransformArgs,
};
use crate::logging::redact_value;
use crate::progress::with_spinner;
use crate::summary::{
    ColumnProfile, describe_table, hints_table, histogram_text, levene_line, normality_table,
    preview_table, render_design, render_probit, render_result, render_service_json,
    render_spatial,
};

const HISTOGRAM_BINS: usize = 10;

/// Read and parse the file named by `input` under `policy`.
pub fn load_dataset(input: &FileArgs, policy: &UploadPolicy) -> Result<Dataset> {
    let mut upload = Upload::from_path(&input.file)?;
    let mut dataset = parse_upload(&mut upload, policy, input.sheet.as_deref())
        .with_context(|| format!("load {}", input.file.display()))?;
    infer_column_kinds(&mut dataset);
    if dataset.rows.is_empty() {
        bail!("{} has a header row but no data", input.file.display());
    }
    Ok(dataset)
}

/// Fail with a closest-name suggestion when `column` is missing.
pub fn require_column(dataset: &Dataset, column: &str) -> Result<()> {
    if dataset.has_column(column) {
        return Ok(());
    }
    let names = dataset.column_names();
    Err(MappingError::ColumnNotFound {
        column: column.to_string(),
        suggestion: suggest_column(column, names.iter().map(String::as_str)),
    }
    .into())
}

/// The file as a service receives it: CSV files as uploaded, worksheets
/// converted to CSV.
pub fn service_file(input: &FileArgs, dataset: &Dataset) -> Result<UploadFile> {
    let upload = Upload::from_path(&input.file)?;
    if FileKind::detect(upload.name()) == Some(FileKind::Csv) {
        let bytes = upload.bytes().map(<[u8]>::to_vec).unwrap_or_default();
        return Ok(UploadFile::new(upload.name(), bytes));
    }
    let csv = write_csv(&dataset.rows, &dataset.column_names())?;
    debug!(source = %dataset.source_name, bytes = csv.len(), "worksheet converted to csv");
    Ok(UploadFile::converted_sheet(csv))
}

pub fn run_preview(args: &PreviewArgs, policy: &UploadPolicy) -> Result<String> {
    let dataset = load_dataset(&args.input, policy)?;
    let hints = build_column_hints(&dataset);
    Ok(format!(
        "{} ({} rows, {} columns)\n{}\n{}",
        dataset.source_name,
        dataset.rows.len(),
        dataset.columns.len(),
        preview_table(&dataset, args.rows),
        hints_table(&hints),
    ))
}

pub fn run_sheets(file: &Path) -> Result<String> {
    let upload = Upload::from_path(file)?;
    let bytes = upload.bytes().ok_or_else(|| anyhow!("{} is empty", file.display()))?;
    let names = sheet_names(upload.name(), bytes)?;
    Ok(names.join("\n"))
}

/// Descriptive statistics, normality and equal-variance screens.
pub fn run_describe(args: &DescribeArgs, policy: &UploadPolicy) -> Result<String> {
    let dataset = load_dataset(&args.input, policy)?;
    let columns = if args.columns.is_empty() {
        build_column_hints(&dataset)
            .into_iter()
            .filter(|(_, hint)| hint.is_numeric)
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
    } else {
        for column in &args.columns {
            require_column(&dataset, column)?;
        }
        args.columns.clone()
    };
    if columns.is_empty() {
        bail!("{} has no numeric columns to describe", dataset.source_name);
    }
    if let Some(group) = &args.group {
        require_column(&dataset, group)?;
    }

    let profiles: Vec<ColumnProfile> = columns
        .iter()
        .map(|name| {
            let values = dataset.numeric_values(name);
            ColumnProfile {
                name: name.clone(),
                descriptive: describe(&values),
                normality: ks_normality(&values),
            }
        })
        .collect();
    let mut out = describe_table(&profiles).to_string();

    if let [profile] = profiles.as_slice() {
        let values = dataset.numeric_values(&profile.name);
        let bins = histogram(&values, HISTOGRAM_BINS);
        if !bins.is_empty() {
            out.push_str(&format!("\n{}\n{}", profile.name, histogram_text(&bins)));
        }
    }
    if let Some(group) = &args.group {
        for name in &columns {
            match levene_by_column(&dataset, name, group) {
                Some(levene) => out.push_str(&format!("\n{}", levene_line(group, &levene))),
                None => out.push_str(&format!("\nLevene by {group}: not enough groups for {name}")),
            }
        }
    }
    Ok(out)
}

pub struct AnalyzeOutput {
    pub result: AnalysisResult,
    pub rendered: String,
}

/// Walk the wizard from upload to results with the roles given on the
/// command line.
pub fn run_analyze(registry: &ServiceRegistry, args: &AnalyzeArgs) -> Result<AnalyzeOutput> {
    let span = info_span!("analyze", analysis = %args.analysis_type);
    let _guard = span.enter();
    let start = Instant::now();

    let mut wizard = Wizard::new(registry.config().upload_policy());
    let mut upload = Upload::from_path(&args.input.file)?;
    wizard
        .load_upload(&mut upload, args.input.sheet.as_deref())
        .with_context(|| format!("load {}", args.input.file.display()))?;
    wizard.next(registry.backend())?;

    let mut roles = vec![(args.dependent.as_str(), VariableRole::Dependent)];
    roles.extend(
        args.independent
            .iter()
            .map(|column| (column.as_str(), VariableRole::Independent)),
    );
    roles.extend(args.values.iter().map(|column| (column.as_str(), VariableRole::Values)));
    roles.extend(
        args.covariates
            .iter()
            .map(|column| (column.as_str(), VariableRole::Covariate)),
    );
    for (column, role) in roles {
        let assignment = wizard.assign(column, role)?;
        if let Some(evicted) = assignment.evicted {
            warn!(column = %evicted, role = %role, "column replaced in single-slot role");
        }
        debug!(column, role = %role, "role assigned");
    }
    wizard.next(registry.backend())?;

    wizard.select_analysis(args.analysis_type);
    with_spinner(&format!("Running {}", args.analysis_type), || {
        wizard.next(registry.backend())
    })?;
    if wizard.step() != WizardStep::Results {
        bail!("analysis did not reach the results step");
    }
    let result = wizard
        .result()
        .cloned()
        .ok_or_else(|| anyhow!("no analysis result"))?;
    info!(
        title = result.title(),
        error = result.is_error(),
        duration_ms = start.elapsed().as_millis(),
        "analysis finished"
    );

    let mut rendered = if args.json {
        serde_json::to_string_pretty(&result).context("serialize result")?
    } else {
        render_result(&result)
    };
    if args.explain {
        let assistant = registry.assistant()?;
        let explanation = with_spinner("Generating explanation", || {
            assistant.explain_result(
                &result,
                args.analysis_type.as_str(),
                args.context.as_deref(),
            )
        });
        rendered.push_str(&format!("\n\nAI Explanation\n{explanation}"));
    }
    Ok(AnalyzeOutput { result, rendered })
}

/// Explain saved results. JSON written by `analyze --json` is digested;
/// any other text is passed through as is.
pub fn run_explain(registry: &ServiceRegistry, args: &ExplainArgs) -> Result<String> {
    let content = std::fs::read_to_string(&args.results)
        .with_context(|| format!("read {}", args.results.display()))?;
    let assistant = registry.assistant()?;
    let analysis_type = args.analysis_type.as_str();
    let explanation = match serde_json::from_str::<AnalysisResult>(&content) {
        Ok(result) => with_spinner("Generating explanation", || {
            assistant.explain_result(&result, analysis_type, args.context.as_deref())
        }),
        Err(error) => {
            debug!(%error, "results are not a saved analysis, explaining as text");
            let mut text = content.trim().to_string();
            if let Some(context) = args.context.as_deref().filter(|c| !c.trim().is_empty()) {
                text.push_str(&format!("\nUser context: {context}"));
            }
            with_spinner("Generating explanation", || assistant.explain(&text, analysis_type))
        }
    };
    Ok(explanation)
}

pub fn run_ask(registry: &ServiceRegistry, question: &[String]) -> Result<String> {
    let question = question.join(" ");
    if question.trim().is_empty() {
        bail!("the question is empty");
    }
    let assistant = registry.assistant()?;
    Ok(with_spinner("Thinking", || assistant.answer_question(&question)))
}

pub fn run_spatial(registry: &ServiceRegistry, args: &SpatialArgs) -> Result<String> {
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    let columns = SpatialColumns {
        location: args.location.clone(),
        value: args.value.clone(),
        latitude: args.latitude.clone(),
        longitude: args.longitude.clone(),
    };
    for column in [Some(&columns.location), Some(&columns.value)]
        .into_iter()
        .chain([columns.latitude.as_ref(), columns.longitude.as_ref()])
        .flatten()
    {
        require_column(&dataset, column)?;
    }
    let result = with_spinner("Running spatial analysis", || {
        registry.spatial().analyze(&dataset.rows, &columns)
    })?;
    let reading = result.moran_i.as_ref().map(interpret_moran);
    let mut out = render_spatial(&result, reading.as_ref());
    if let Some(path) = &args.map_output {
        let html = result
            .interactive_map
            .as_deref()
            .ok_or_else(|| anyhow!("the spatial service returned no interactive map"))?;
        std::fs::write(path, html).with_context(|| format!("write {}", path.display()))?;
        out.push_str(&format!("Map written to {}\n", path.display()));
    }
    Ok(out)
}

pub fn run_rbd(registry: &ServiceRegistry, args: &RbdArgs) -> Result<String> {
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    for column in [&args.block, &args.factor, &args.response] {
        require_column(&dataset, column)?;
    }
    let request = RbdRequest {
        block_col: args.block.clone(),
        factor_col: args.factor.clone(),
        response_col: args.response.clone(),
    };
    let result = with_spinner("Running RBD analysis", || {
        registry.design().rbd(&dataset.rows, &request)
    })?;
    let mut out = render_design(&result);
    if args.summary {
        let assistant = registry.assistant()?;
        let summary = with_spinner("Generating summary", || {
            assistant.summarize_rbd_result(&result)
        })?;
        out.push_str(&format!("\nAI Summary\n{summary}\n"));
    }
    Ok(out)
}

pub fn run_frbd(registry: &ServiceRegistry, args: &FrbdArgs) -> Result<String> {
    if args.factors.len() < 2 {
        bail!("a factorial design needs at least two --factor columns");
    }
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    for column in std::iter::once(&args.block)
        .chain(&args.factors)
        .chain(std::iter::once(&args.response))
    {
        require_column(&dataset, column)?;
    }
    let request = FrbdRequest {
        block_col: args.block.clone(),
        factor_cols: args.factors.clone(),
        response_col: args.response.clone(),
    };
    let result = with_spinner("Running FRBD analysis", || {
        registry.design().frbd(&dataset.rows, &request)
    })?;
    let mut out = render_design(&result);
    if args.summary {
        let assistant = registry.assistant()?;
        let summary = with_spinner("Generating summary", || {
            assistant.summarize_frbd_result(&result)
        })?;
        out.push_str(&format!("\nAI Summary\n{summary}\n"));
    }
    Ok(out)
}

/// Normality screen, then optionally apply a transformation and export
/// original and transformed values side by side.
pub fn run_transform(registry: &ServiceRegistry, args: &TransformArgs) -> Result<String> {
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    require_column(&dataset, &args.response)?;
    let client = registry.transform();
    let report = with_spinner("Screening normality", || {
        client.analyze(&dataset.rows, &args.response)
    })?;
    let mut out = normality_table(&args.response, &report.summary()).to_string();

    let choice = match (&args.apply, args.recommended) {
        (Some(choice), _) => Some(choice.clone()),
        (None, true) => match report.recommended_transform() {
            Some(choice) => Some(choice.to_string()),
            None => {
                out.push_str("\nNo transformation needed.");
                None
            }
        },
        (None, false) => None,
    };
    let Some(choice) = choice else {
        return Ok(out);
    };

    let payload = with_spinner(&format!("Applying {choice}"), || {
        client.apply(&dataset.rows, &args.response, &choice)
    })?;
    let transformed = payload.transformed_rows()?;
    let first_value = transformed
        .first()
        .and_then(|row| row.get(&payload.transformed_response_col))
        .map(ToString::to_string)
        .unwrap_or_default();
    debug!(
        column = %payload.transformed_response_col,
        rows = transformed.len(),
        first = redact_value(&first_value),
        "transform applied"
    );
    let csv = export_transformed(
        &dataset.rows,
        &args.response,
        &transformed,
        &payload.transformed_response_col,
    )?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &csv).with_context(|| format!("write {}", path.display()))?;
            out.push_str(&format!(
                "\n{} rows written to {}",
                transformed.len(),
                path.display()
            ));
        }
        None => out.push_str(&format!("\n{csv}")),
    }
    Ok(out)
}

pub fn run_nonparametric(registry: &ServiceRegistry, args: &NonParametricArgs) -> Result<String> {
    let test = match (args.test, args.groups, args.scale) {
        (Some(test), _, _) => test,
        (None, Some(groups), Some(scale)) => {
            recommend_test(groups.into(), args.design.into(), scale.into())
                .ok_or_else(|| anyhow!("No suitable test found for the selected combination."))?
        }
        _ => bail!("give --test, or --groups and --scale to pick one"),
    };
    info!(test = test.key(), "non-parametric test selected");
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    let file = service_file(&args.input, &dataset)?;
    let result = with_spinner(&format!("Running {test}"), || {
        registry.nonparametric().analyze(test, &file)
    })?;
    let mut out = format!("Test: {test}\nData format: {}\n\n", test.data_format());
    out.push_str(&render_service_json("Results", &result));
    Ok(out)
}

pub fn run_lmm(registry: &ServiceRegistry, args: &LmmArgs) -> Result<String> {
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    let tukey = args
        .tukey
        .clone()
        .or_else(|| args.fixed_effects.first().cloned())
        .unwrap_or_default();
    for column in [&args.response, &args.group, &tukey]
        .into_iter()
        .chain(&args.fixed_effects)
    {
        require_column(&dataset, column)?;
    }
    let request = LmmRequest {
        response_col: args.response.clone(),
        group_col: args.group.clone(),
        fixed_effects: args.fixed_effects.clone(),
        tukey_factor: tukey,
    };
    let result = with_spinner("Running mixed model", || {
        registry.mixed().lmm(&dataset.rows, &request)
    })?;
    Ok(render_service_json("Linear Mixed Model Results", &result))
}

pub fn run_blup(registry: &ServiceRegistry, args: &BlupArgs) -> Result<String> {
    let request = BlupRequest {
        dependent_var: args.dependent.clone(),
        genotype_var: args.genotype.clone(),
        rep_var: args.rep.clone(),
        block_var: args.block.clone(),
        env_var: args.environment.clone(),
        year_var: args.year.clone(),
    };
    request.validate()?;
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    for column in [
        &args.dependent,
        &args.genotype,
        &args.rep,
        &args.block,
        &args.environment,
        &args.year,
    ] {
        require_column(&dataset, column)?;
    }
    let result = with_spinner("Running BLUP analysis", || {
        registry.mixed().blup(&dataset.rows, &request)
    })?;
    Ok(render_service_json("BLUP Results", &result))
}

pub fn run_survival(registry: &ServiceRegistry, args: &SurvivalArgs) -> Result<String> {
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    for column in &args.covariates {
        require_column(&dataset, column)?;
    }
    let file = service_file(&args.input, &dataset)?;
    let result = with_spinner("Running survival analysis", || {
        registry.survival().analyze(&file, &args.covariates)
    })?;
    Ok(render_service_json("Survival Analysis Results", &result))
}

pub fn run_probit(registry: &ServiceRegistry, args: &ProbitArgs) -> Result<String> {
    let dataset = load_dataset(&args.input, &registry.config().upload_policy())?;
    let file = service_file(&args.input, &dataset)?;
    let result = with_spinner("Running probit analysis", || registry.probit().analyze(&file))?;
    Ok(render_probit(&result))
}

pub fn run_config(config: &ServiceConfig) -> Result<String> {
    Ok(config.to_toml()?)
}
