//! Demonstration backend returning fixed example results.

use statviz_model::{
    AnalysisResult, AnalysisType, AnovaResult, PostHocComparison, PostHocResult, PostHocTests,
    RegressionCoefficient, RegressionResult, Statistics, SummaryTable, TableCell,
};

use crate::backend::{AnalysisBackend, AnalysisRequest};
use crate::error::Result;

pub const ANOVA_HEADERS: [&str; 6] = ["Source", "SS", "df", "MS", "F", "p-value"];

/// Returns hard-coded results per analysis type, ignoring the data.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBackend;

impl AnalysisBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        Ok(match request.analysis_type {
            AnalysisType::Anova => anova(),
            AnalysisType::Ancova => ancova(),
            AnalysisType::TukeyHsd => tukey(),
            AnalysisType::LinearRegression => {
                regression(&request.variables.independent_variables)
            }
        })
    }
}

fn row<const N: usize>(cells: [TableCell; N]) -> Vec<TableCell> {
    cells.into()
}

fn blank() -> TableCell {
    TableCell::Text(String::new())
}

fn stats<const N: usize>(entries: [(&str, f64); N]) -> Statistics {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), TableCell::Number(value)))
        .collect()
}

fn anova() -> AnalysisResult {
    let table = SummaryTable::new(ANOVA_HEADERS)
        .with_row(row([
            "Between Groups".into(),
            245.67.into(),
            2.0.into(),
            122.835.into(),
            8.42.into(),
            0.0012.into(),
        ]))
        .with_row(row([
            "Within Groups".into(),
            393.75.into(),
            27.0.into(),
            14.583.into(),
            blank(),
            blank(),
        ]))
        .with_row(row([
            "Total".into(),
            639.42.into(),
            29.0.into(),
            blank(),
            blank(),
            blank(),
        ]));
    AnalysisResult::Anova(AnovaResult {
        title: "One-Way ANOVA Results".to_string(),
        summary_table: table,
        statistics: stats([("F", 8.42), ("p-value", 0.0012), ("eta²", 0.384)]),
    })
}

fn ancova() -> AnalysisResult {
    let table = SummaryTable::new(ANOVA_HEADERS)
        .with_row(row([
            "Covariate".into(),
            88.14.into(),
            1.0.into(),
            88.14.into(),
            7.05.into(),
            0.0134.into(),
        ]))
        .with_row(row([
            "Treatment".into(),
            201.36.into(),
            2.0.into(),
            100.68.into(),
            8.05.into(),
            0.0019.into(),
        ]))
        .with_row(row([
            "Error".into(),
            325.1.into(),
            26.0.into(),
            12.504.into(),
            blank(),
            blank(),
        ]))
        .with_row(row([
            "Total".into(),
            614.6.into(),
            29.0.into(),
            blank(),
            blank(),
            blank(),
        ]));
    AnalysisResult::Anova(AnovaResult {
        title: "ANCOVA Results".to_string(),
        summary_table: table,
        statistics: stats([
            ("Adjusted F", 8.05),
            ("Adjusted p-value", 0.0019),
            ("Partial eta²", 0.382),
        ]),
    })
}

fn comparison(name: &str, diff: f64, lower: f64, upper: f64, q: f64, p: f64) -> PostHocComparison {
    PostHocComparison {
        comparison: name.to_string(),
        diff,
        lower,
        upper,
        q_value: Some(q),
        p_value: p,
        significant: p < 0.05,
    }
}

fn tukey() -> AnalysisResult {
    AnalysisResult::PostHoc(PostHocResult {
        title: "Tukey's HSD Post-Hoc Test".to_string(),
        summary_table: None,
        statistics: stats([("alpha", 0.05)]),
        tests: PostHocTests {
            test_name: "Tukey's HSD".to_string(),
            results: vec![
                comparison("Group A - Group B", 4.52, 1.18, 7.86, 4.11, 0.0067),
                comparison("Group A - Group C", 6.95, 3.61, 10.29, 6.32, 0.0002),
                comparison("Group B - Group C", 2.43, -0.91, 5.77, 2.21, 0.1864),
            ],
        },
    })
}

fn regression(predictors: &[String]) -> AnalysisResult {
    let mut coefficients = vec![RegressionCoefficient {
        term: "Intercept".to_string(),
        estimate: 12.48,
        std_error: 2.31,
        t_value: 5.4,
        p_value: 0.0001,
    }];
    let names: Vec<&str> = if predictors.is_empty() {
        vec!["X1"]
    } else {
        predictors.iter().map(String::as_str).collect()
    };
    for (idx, name) in names.into_iter().enumerate() {
        let step = idx as f64;
        coefficients.push(RegressionCoefficient {
            term: name.to_string(),
            estimate: 0.85 - 0.2 * step,
            std_error: 0.14 + 0.02 * step,
            t_value: 6.07 - 1.5 * step,
            p_value: 0.0001 + 0.01 * step,
        });
    }
    AnalysisResult::Regression(RegressionResult {
        title: "Linear Regression Results".to_string(),
        summary_table: None,
        statistics: stats([
            ("R²", 0.742),
            ("Adjusted R²", 0.728),
            ("F", 36.84),
            ("p-value", 0.0001),
        ]),
        coefficients,
    })
}
