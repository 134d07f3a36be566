//! Analysis kinds and the result shapes they produce.
//!
//! Backends answer with a loosely-typed JSON bag (`title`, `summaryTable`,
//! `statistics`, `postHocTests`, `regressionCoefficients`, `rawOutput`).
//! [`AnalysisResult`] classifies that bag into one variant per shape and
//! serializes back to the same wire form.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::table::format_number;

/// Statistical test requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisType {
    #[serde(rename = "ANOVA")]
    Anova,
    #[serde(rename = "ANCOVA")]
    Ancova,
    #[serde(rename = "Tukey's HSD")]
    TukeyHsd,
    #[serde(rename = "Linear Regression")]
    LinearRegression,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        Self::Anova,
        Self::Ancova,
        Self::TukeyHsd,
        Self::LinearRegression,
    ];

    /// Wire name, as the backend expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anova => "ANOVA",
            Self::Ancova => "ANCOVA",
            Self::TukeyHsd => "Tukey's HSD",
            Self::LinearRegression => "Linear Regression",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Anova => "Compare means of two or more groups",
            Self::Ancova => "Compare group means while controlling for covariates",
            Self::TukeyHsd => "Pairwise post-hoc comparisons after ANOVA",
            Self::LinearRegression => "Model a response from one or more predictors",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "anova" => Ok(Self::Anova),
            "ancova" => Ok(Self::Ancova),
            "tukey" | "tukeyshsd" | "tukeyhsd" | "hsd" => Ok(Self::TukeyHsd),
            "linearregression" | "regression" | "lm" => Ok(Self::LinearRegression),
            _ => Err(ModelError::UnknownAnalysisType(s.to_string())),
        }
    }
}

/// A table cell in a result table: text or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableCell {
    Number(f64),
    Text(String),
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for TableCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TableCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for TableCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

pub type Statistics = BTreeMap<String, TableCell>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
}

impl SummaryTable {
    pub fn new<H: Into<String>>(headers: impl IntoIterator<Item = H>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<TableCell>) -> Self {
        self.rows.push(row);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostHocComparison {
    pub comparison: String,
    pub diff: f64,
    pub lower: f64,
    pub upper: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_value: Option<f64>,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostHocTests {
    pub test_name: String,
    pub results: Vec<PostHocComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionCoefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnovaResult {
    pub title: String,
    pub summary_table: SummaryTable,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostHocResult {
    pub title: String,
    pub summary_table: Option<SummaryTable>,
    pub statistics: Statistics,
    pub tests: PostHocTests,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionResult {
    pub title: String,
    pub summary_table: Option<SummaryTable>,
    pub statistics: Statistics,
    pub coefficients: Vec<RegressionCoefficient>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub title: String,
    pub raw_output: Option<String>,
    pub statistics: Statistics,
}

/// Failed dispatch folded into a displayable result.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResult {
    pub title: String,
    pub summary_table: SummaryTable,
    pub statistics: Statistics,
}

/// Result of one analysis, one variant per shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireAnalysisResult", into = "WireAnalysisResult")]
pub enum AnalysisResult {
    Anova(AnovaResult),
    PostHoc(PostHocResult),
    Regression(RegressionResult),
    Raw(RawResult),
    Error(ErrorResult),
}

impl AnalysisResult {
    pub fn title(&self) -> &str {
        match self {
            Self::Anova(r) => &r.title,
            Self::PostHoc(r) => &r.title,
            Self::Regression(r) => &r.title,
            Self::Raw(r) => &r.title,
            Self::Error(r) => &r.title,
        }
    }

    pub fn summary_table(&self) -> Option<&SummaryTable> {
        match self {
            Self::Anova(r) => Some(&r.summary_table),
            Self::PostHoc(r) => r.summary_table.as_ref(),
            Self::Regression(r) => r.summary_table.as_ref(),
            Self::Raw(_) => None,
            Self::Error(r) => Some(&r.summary_table),
        }
    }

    pub fn statistics(&self) -> &Statistics {
        match self {
            Self::Anova(r) => &r.statistics,
            Self::PostHoc(r) => &r.statistics,
            Self::Regression(r) => &r.statistics,
            Self::Raw(r) => &r.statistics,
            Self::Error(r) => &r.statistics,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Error-shaped result for a failed analysis of `analysis_type`.
    pub fn failure(
        analysis_type: AnalysisType,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let mut statistics = Statistics::new();
        statistics.insert(
            "error".to_string(),
            TableCell::Text("Failed to fetch results from the analysis backend.".to_string()),
        );
        statistics.insert("details".to_string(), TableCell::Text(details.into()));
        Self::Error(ErrorResult {
            title: format!("Error: {analysis_type} Failed"),
            summary_table: SummaryTable::new(["Error"])
                .with_row(vec![TableCell::Text(message)]),
            statistics,
        })
    }
}

/// Loosely-typed wire form of an analysis result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAnalysisResult {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_table: Option<SummaryTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_hoc_tests: Option<PostHocTests>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regression_coefficients: Option<Vec<RegressionCoefficient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl From<WireAnalysisResult> for AnalysisResult {
    fn from(wire: WireAnalysisResult) -> Self {
        let statistics = wire.statistics.unwrap_or_default();
        if wire.title.starts_with("Error:") {
            return Self::Error(ErrorResult {
                title: wire.title,
                summary_table: wire.summary_table.unwrap_or_else(|| SummaryTable::new(["Error"])),
                statistics,
            });
        }
        if let Some(tests) = wire.post_hoc_tests {
            return Self::PostHoc(PostHocResult {
                title: wire.title,
                summary_table: wire.summary_table,
                statistics,
                tests,
            });
        }
        if let Some(coefficients) = wire.regression_coefficients {
            return Self::Regression(RegressionResult {
                title: wire.title,
                summary_table: wire.summary_table,
                statistics,
                coefficients,
            });
        }
        match wire.summary_table {
            Some(summary_table) => Self::Anova(AnovaResult {
                title: wire.title,
                summary_table,
                statistics,
            }),
            None => Self::Raw(RawResult {
                title: wire.title,
                raw_output: wire.raw_output,
                statistics,
            }),
        }
    }
}

fn non_empty(statistics: Statistics) -> Option<Statistics> {
    if statistics.is_empty() {
        None
    } else {
        Some(statistics)
    }
}

impl From<AnalysisResult> for WireAnalysisResult {
    fn from(result: AnalysisResult) -> Self {
        match result {
            AnalysisResult::Anova(r) => Self {
                title: r.title,
                summary_table: Some(r.summary_table),
                statistics: non_empty(r.statistics),
                ..Self::default()
            },
            AnalysisResult::PostHoc(r) => Self {
                title: r.title,
                summary_table: r.summary_table,
                statistics: non_empty(r.statistics),
                post_hoc_tests: Some(r.tests),
                ..Self::default()
            },
            AnalysisResult::Regression(r) => Self {
                title: r.title,
                summary_table: r.summary_table,
                statistics: non_empty(r.statistics),
                regression_coefficients: Some(r.coefficients),
                ..Self::default()
            },
            AnalysisResult::Raw(r) => Self {
                title: r.title,
                statistics: non_empty(r.statistics),
                raw_output: r.raw_output,
                ..Self::default()
            },
            AnalysisResult::Error(r) => Self {
                title: r.title,
                summary_table: Some(r.summary_table),
                statistics: non_empty(r.statistics),
                ..Self::default()
            },
        }
    }
}
