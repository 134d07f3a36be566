//! Terminal rendering of datasets and analysis results.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use serde_json::Value;
use statviz_analysis::{Descriptive, HistogramBin, KsResult, LeveneResult, MoranInterpretation};
use statviz_ingest::ColumnHint;
use statviz_model::{
    AnalysisResult, Dataset, DesignResult, NormalitySummary, PostHocComparison, ProbitResult,
    RegressionCoefficient, SpatialResult, Statistics, SummaryTable, format_number,
};

const PREVIEW_WIDTH: u16 = 120;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(PREVIEW_WIDTH);
}

/// First `limit` rows of `dataset`, one column per header.
pub fn preview_table(dataset: &Dataset, limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(
        dataset
            .columns
            .iter()
            .map(|column| header_cell(&column.name))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for row in dataset.rows.iter().take(limit) {
        table.add_row(
            dataset
                .columns
                .iter()
                .map(|column| match row.get(&column.name) {
                    Some(value) if !value.is_blank() => Cell::new(value.to_string()),
                    _ => dim_cell("-"),
                })
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Per-column kind and ratios used when picking roles.
pub fn hints_table(hints: &BTreeMap<String, ColumnHint>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Unique"),
        header_cell("Missing"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (name, hint) in hints {
        let kind = if hint.is_numeric { "numeric" } else { "categorical" };
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(kind),
            Cell::new(percent(hint.unique_ratio)),
            ratio_cell(hint.null_ratio),
        ]);
    }
    table
}

/// Everything an analysis result carries, as printable text.
pub fn render_result(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.title());
    if let Some(summary) = result.summary_table() {
        let _ = writeln!(out, "{}", summary_table(summary));
    }
    if !result.statistics().is_empty() {
        let _ = writeln!(out, "Key Statistics");
        let _ = writeln!(out, "{}", statistics_table(result.statistics()));
    }
    match result {
        AnalysisResult::PostHoc(post_hoc) => {
            let _ = writeln!(out, "{}", post_hoc.tests.test_name);
            let _ = writeln!(out, "{}", post_hoc_table(&post_hoc.tests.results));
        }
        AnalysisResult::Regression(regression) => {
            let _ = writeln!(out, "Regression Coefficients");
            let _ = writeln!(out, "{}", coefficients_table(&regression.coefficients));
        }
        AnalysisResult::Raw(raw) => {
            if let Some(output) = &raw.raw_output {
                let _ = writeln!(out, "{output}");
            }
        }
        AnalysisResult::Anova(_) | AnalysisResult::Error(_) => {}
    }
    out
}

pub fn summary_table(summary: &SummaryTable) -> Table {
    let mut table = Table::new();
    table.set_header(
        summary
            .headers
            .iter()
            .map(|header| header_cell(header))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for row in &summary.rows {
        table.add_row(row.iter().map(|cell| Cell::new(cell.to_string())).collect::<Vec<_>>());
    }
    table
}

pub fn statistics_table(statistics: &Statistics) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Statistic"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (name, value) in statistics {
        table.add_row(vec![Cell::new(name), Cell::new(value.to_string())]);
    }
    table
}

pub fn post_hoc_table(comparisons: &[PostHocComparison]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Comparison"),
        header_cell("Diff"),
        header_cell("Lower"),
        header_cell("Upper"),
        header_cell("q"),
        header_cell("p"),
        header_cell("Significant"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=5 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    align_column(&mut table, 6, CellAlignment::Center);
    for comparison in comparisons {
        table.add_row(vec![
            Cell::new(&comparison.comparison),
            Cell::new(fixed(comparison.diff)),
            Cell::new(fixed(comparison.lower)),
            Cell::new(fixed(comparison.upper)),
            comparison
                .q_value
                .map_or_else(|| dim_cell("-"), |q| Cell::new(fixed(q))),
            Cell::new(fixed(comparison.p_value)),
            significance_cell(comparison.significant),
        ]);
    }
    table
}

pub fn coefficients_table(coefficients: &[RegressionCoefficient]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Term"),
        header_cell("Estimate"),
        header_cell("Std. Error"),
        header_cell("t"),
        header_cell("p"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=4 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for coefficient in coefficients {
        table.add_row(vec![
            Cell::new(&coefficient.term).add_attribute(Attribute::Bold),
            Cell::new(fixed(coefficient.estimate)),
            Cell::new(fixed(coefficient.std_error)),
            Cell::new(fixed(coefficient.t_value)),
            Cell::new(fixed(coefficient.p_value)),
        ]);
    }
    table
}

/// One column's data-quality screen.
#[derive(Debug, Clone)]
pub struct ColumnProfile {
    pub name: String,
    pub descriptive: Option<Descriptive>,
    pub normality: Option<KsResult>,
}

pub fn describe_table(profiles: &[ColumnProfile]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("N"),
        header_cell("Mean"),
        header_cell("Median"),
        header_cell("Mode"),
        header_cell("SD"),
        header_cell("Min"),
        header_cell("Max"),
        header_cell("KS p"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=8 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for profile in profiles {
        let name = Cell::new(&profile.name).add_attribute(Attribute::Bold);
        let Some(stats) = &profile.descriptive else {
            let mut row = vec![name, Cell::new(0)];
            row.extend((0..7).map(|_| dim_cell("-")));
            table.add_row(row);
            continue;
        };
        let ks = match &profile.normality {
            Some(ks) if ks.p_value < 0.05 => Cell::new(fixed(ks.p_value)).fg(Color::Yellow),
            Some(ks) => Cell::new(fixed(ks.p_value)),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            name,
            Cell::new(stats.count),
            Cell::new(fixed(stats.mean)),
            Cell::new(fixed(stats.median)),
            Cell::new(format_number(stats.mode)),
            Cell::new(fixed(stats.standard_deviation)),
            Cell::new(format_number(stats.min)),
            Cell::new(format_number(stats.max)),
            ks,
        ]);
    }
    table
}

pub fn histogram_text(bins: &[HistogramBin]) -> String {
    let widest = bins.iter().map(|bin| bin.count).max().unwrap_or(0).max(1);
    bins.iter()
        .map(|bin| {
            let bar = "#".repeat(bin.count * 40 / widest);
            format!(
                "{:>10} - {:<10} {:>4} {bar}",
                fixed(bin.lower),
                fixed(bin.upper),
                bin.count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn levene_line(group: &str, levene: &LeveneResult) -> String {
    match levene.p_value {
        Some(p) => {
            let verdict = if p < 0.05 {
                "variances differ between groups"
            } else {
                "no evidence of unequal variances"
            };
            format!("Levene by {group}: W = {}, p = {}, {verdict}", fixed(levene.w), fixed(p))
        }
        None => format!("Levene by {group}: W = {}", fixed(levene.w)),
    }
}

pub fn render_spatial(result: &SpatialResult, reading: Option<&MoranInterpretation>) -> String {
    let mut out = String::new();
    match (&result.moran_i, reading) {
        (Some(moran), Some(reading)) => {
            let _ = writeln!(out, "Moran's I: {:.4} (p = {:.4})", moran.i, moran.p_value);
            let _ = writeln!(out, "{}", reading.autocorrelation);
            let _ = writeln!(out, "{}", reading.significance);
        }
        _ => {
            let _ = writeln!(out, "Moran's I: not available");
        }
    }
    if let Some(plots) = &result.plots {
        let names: Vec<&str> = plots.keys().map(String::as_str).collect();
        let _ = writeln!(out, "Plots: {}", names.join(", "));
    }
    if result.interactive_map.is_some() {
        let _ = writeln!(out, "Interactive map available");
    }
    out
}

/// Significance per ANOVA term, CV, CD and residual normality.
pub fn render_design(result: &DesignResult) -> String {
    let mut out = String::new();
    let significance = result.anova_significance();
    if significance.is_empty() {
        if let Some(text) = result.anova_table_text() {
            let _ = writeln!(out, "ANOVA table:\n{text}");
        }
    } else {
        let mut table = Table::new();
        table.set_header(vec![header_cell("Term"), header_cell("Significant (p < 0.05)")]);
        apply_table_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Center);
        for (term, significant) in &significance {
            table.add_row(vec![Cell::new(term), significance_cell(*significant)]);
        }
        let _ = writeln!(out, "{table}");
    }
    match result.overall_cv() {
        Some(cv) => {
            let _ = writeln!(out, "Coefficient of variation: {cv:.2}%");
        }
        None => {
            let _ = writeln!(out, "Coefficient of variation: Not available");
        }
    }
    match result.cd_value().filter(|cd| cd.is_finite() && *cd != 0.0) {
        Some(cd) => {
            let _ = writeln!(out, "Critical difference: {cd:.4}");
        }
        None => {
            let _ = writeln!(out, "Critical difference: Not available");
        }
    }
    if let Some(shapiro) = result.shapiro() {
        let verdict = if shapiro.p > 0.05 {
            "residuals look normal"
        } else {
            "residuals depart from normality"
        };
        let _ = writeln!(
            out,
            "Shapiro-Wilk: W = {:.4}, p = {:.4} ({verdict})",
            shapiro.stat, shapiro.p
        );
    }
    let plots = result.plots();
    if !plots.is_empty() {
        let names: Vec<&str> = plots.keys().map(String::as_str).collect();
        let _ = writeln!(out, "Plots: {}", names.join(", "));
    }
    out
}

/// Service payload under a title, as indented JSON.
pub fn render_service_json(title: &str, value: &Value) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("{title}\n{body}")
}

pub fn render_probit(result: &ProbitResult) -> String {
    let mut out = render_service_json("Finney's method", &result.finney);
    match &result.profile_likelihood {
        Some(profile) => {
            let _ = write!(out, "\n\n{}", render_service_json("Profile likelihood", profile));
        }
        None => out.push_str("\n\nProfile likelihood: Not available"),
    }
    out
}

pub fn normality_table(column: &str, summary: &NormalitySummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Shapiro-Wilk"),
        header_cell("D'Agostino-Pearson"),
        header_cell("Kolmogorov-Smirnov"),
        header_cell("Skewness"),
        header_cell("Kurtosis"),
        header_cell("Recommendation"),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new(column).add_attribute(Attribute::Bold),
        Cell::new(&summary.shapiro_wilk),
        Cell::new(&summary.dagostino_pearson),
        Cell::new(&summary.kolmogorov_smirnov),
        Cell::new(&summary.skewness),
        Cell::new(&summary.kurtosis),
        Cell::new(&summary.recommendation).fg(Color::Cyan),
    ]);
    table
}

fn fixed(value: f64) -> String {
    format!("{value:.4}")
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

fn ratio_cell(ratio: f64) -> Cell {
    if ratio > 0.0 {
        Cell::new(percent(ratio)).fg(Color::Yellow)
    } else {
        dim_cell(percent(ratio))
    }
}

fn significance_cell(significant: bool) -> Cell {
    if significant {
        Cell::new("yes").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        dim_cell("no")
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
