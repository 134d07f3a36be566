//! Payloads returned by the external analysis services.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, Result};
use crate::table::DataRow;

/// Moran's I statistic from the spatial service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoranStatistic {
    #[serde(rename = "I")]
    pub i: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moran_i: Option<MoranStatistic>,
    /// Plot name to base64-encoded PNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plots: Option<BTreeMap<String, String>>,
    /// Embeddable HTML for the interactive map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_map: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapiroResult {
    pub stat: f64,
    pub p: f64,
}

/// RBD / FRBD service response.
///
/// Kept as raw JSON: the services return pandas-rendered fragments whose
/// shape varies by design. Accessors pick out the fields the summaries use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignResult {
    raw: Value,
}

impl DesignResult {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.raw.get(name).filter(|value| !value.is_null())
    }

    pub fn anova_table(&self) -> Option<&Value> {
        self.field("anova_table")
    }

    /// ANOVA table as text: string payloads verbatim, anything else as JSON.
    pub fn anova_table_text(&self) -> Option<String> {
        self.anova_table().map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    pub fn tukey_results(&self) -> Option<&Value> {
        self.field("tukey_results")
    }

    pub fn shapiro(&self) -> Option<ShapiroResult> {
        self.field("shapiro")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn mean_separation_results(&self) -> Option<&Value> {
        self.field("mean_separation_results")
    }

    pub fn f_oneway_results(&self) -> Option<&Value> {
        self.field("f_oneway_results")
    }

    pub fn overall_cv(&self) -> Option<f64> {
        self.field("overall_cv").and_then(Value::as_f64)
    }

    pub fn cd_value(&self) -> Option<f64> {
        self.field("cd_value").and_then(Value::as_f64)
    }

    /// Plot name to base64 image, skipping non-string entries.
    pub fn plots(&self) -> BTreeMap<String, String> {
        self.field("plots")
            .and_then(Value::as_object)
            .map(|plots| {
                plots
                    .iter()
                    .filter_map(|(name, image)| Some((name.clone(), image.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether each ANOVA term is significant at 0.05, keyed by cleaned name.
    ///
    /// Reads the `PR(>F)` column of the ANOVA table; terms without a p-value
    /// are skipped.
    pub fn anova_significance(&self) -> BTreeMap<String, bool> {
        let table = match self.anova_table() {
            Some(Value::String(text)) => serde_json::from_str::<Value>(text).ok(),
            Some(other) => Some(other.clone()),
            None => None,
        };
        let Some(p_values) = table
            .as_ref()
            .and_then(|table| table.get("PR(>F)"))
            .and_then(Value::as_object)
        else {
            return BTreeMap::new();
        };
        p_values
            .iter()
            .filter_map(|(term, p)| Some((clean_factor_name(term), p.as_f64()? < 0.05)))
            .collect()
    }
}

static QUOTED_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Q\(['"]([^'"]*)['"]\)"#).expect("valid regex"));
static CATEGORICAL_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C\((.+)\)$").expect("valid regex"));

/// Strip patsy wrappers from a model term: `C(Q('Seed Rate'))` becomes
/// `Seed Rate`, interactions join their distinct factors with `:`.
pub fn clean_factor_name(term: &str) -> String {
    let mut factors: Vec<&str> = Vec::new();
    for capture in QUOTED_TERM.captures_iter(term) {
        if let Some(factor) = capture.get(1).map(|m| m.as_str())
            && !factors.contains(&factor)
        {
            factors.push(factor);
        }
    }
    if !factors.is_empty() {
        return factors.join(":");
    }
    match CATEGORICAL_TERM.captures(term).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().to_string(),
        None => term.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestInterpretation {
    #[serde(default)]
    pub interpretation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveInterpretation {
    #[serde(default)]
    pub skewness_interpretation: Option<String>,
    #[serde(default)]
    pub kurtosis_interpretation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginalNormality {
    #[serde(default)]
    pub shapiro_wilk: Option<TestInterpretation>,
    #[serde(default)]
    pub dagostino_pearson: Option<TestInterpretation>,
    #[serde(default)]
    pub kolmogorov_smirnov: Option<TestInterpretation>,
    #[serde(default)]
    pub descriptive_stats: Option<DescriptiveInterpretation>,
}

/// Normality screening returned by the transform-analysis service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalityReport {
    #[serde(default)]
    pub original_normality: Option<OriginalNormality>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Recommendation text meaning the column is already acceptable.
pub const NO_TRANSFORMATION_NEEDED: &str = "No transformation needed";

/// Flattened, display-ready normality row. Missing fields read `-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalitySummary {
    pub shapiro_wilk: String,
    pub dagostino_pearson: String,
    pub kolmogorov_smirnov: String,
    pub skewness: String,
    pub kurtosis: String,
    pub recommendation: String,
}

fn or_dash(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| "-".to_string())
}

impl NormalityReport {
    /// The recommended transform, unless none is needed.
    pub fn recommended_transform(&self) -> Option<&str> {
        self.recommendation
            .as_deref()
            .filter(|text| !text.is_empty() && *text != NO_TRANSFORMATION_NEEDED)
    }

    pub fn summary(&self) -> NormalitySummary {
        let normality = self.original_normality.clone().unwrap_or_default();
        let test = |t: &Option<TestInterpretation>| {
            or_dash(t.as_ref().and_then(|t| t.interpretation.as_ref()))
        };
        let descriptive = normality.descriptive_stats.unwrap_or_default();
        NormalitySummary {
            shapiro_wilk: test(&normality.shapiro_wilk),
            dagostino_pearson: test(&normality.dagostino_pearson),
            kolmogorov_smirnov: test(&normality.kolmogorov_smirnov),
            skewness: or_dash(descriptive.skewness_interpretation.as_ref()),
            kurtosis: or_dash(descriptive.kurtosis_interpretation.as_ref()),
            recommendation: or_dash(self.recommendation.as_ref()),
        }
    }
}

/// Transform-apply response. `transformed_data` is a JSON-encoded row list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformPayload {
    pub transformed_data: String,
    pub transformed_response_col: String,
}

impl TransformPayload {
    pub fn transformed_rows(&self) -> Result<Vec<DataRow>> {
        serde_json::from_str(&self.transformed_data)
            .map_err(|err| ModelError::InvalidPayload(format!("transformed_data: {err}")))
    }
}

/// Probit service response: Finney's method and, when the service ran it,
/// the profile-likelihood fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbitResult {
    pub finney: Value,
    pub profile_likelihood: Option<Value>,
}

impl ProbitResult {
    /// Older services return the Finney result as the whole body.
    pub fn from_response(mut raw: Value) -> Self {
        let present = |name: &str| raw.get(name).is_some_and(|value| !value.is_null());
        if present("finney") && present("profile_likelihood") {
            let finney = raw["finney"].take();
            let profile_likelihood = Some(raw["profile_likelihood"].take());
            return Self {
                finney,
                profile_likelihood,
            };
        }
        Self {
            finney: raw,
            profile_likelihood: None,
        }
    }
}
