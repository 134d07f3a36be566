//! Prompt builders for the explanation, guidance and design-summary flows.

use std::fmt::Write;

use serde_json::Value;
use statviz_model::{AnalysisResult, DesignResult, ShapiroResult, format_number};

use crate::error::{AssistError, Result};

const STATISTICIAN_INTRO: &str =
    "You are a senior agricultural research statistician with expertise in analyzing field trial data.\n";

const DISCLAIMER: &str = "Disclaimer: This summary is generated using AI tools and there may be mistakes. It is crucial to verify the results with a qualified statistician before making any decisions based on this interpretation.\n\n";

const CV_GUIDANCE: &str = "- Comment on the model's fit and reliability using the Coefficient of Variation (CV). A CV less than 10% is excellent, 10-20% is good, and above 20% may indicate high variability.\n\n";

const CLOSING: &str =
    "Structure your response using clear headings and bullet points to make it easy to read and understand.\n";

/// Context line used when the caller gives none.
pub const NO_CONTEXT: &str = "No additional context provided.";

/// Inputs for the RBD interpretation prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct RbdSummaryInput {
    pub anova_table: String,
    pub tukey_results: Value,
    pub shapiro: ShapiroResult,
    pub mean_separation_results: Value,
    pub f_oneway_results: String,
    pub overall_cv: f64,
    pub cd_value: Option<f64>,
}

impl RbdSummaryInput {
    /// Collect the prompt inputs from an RBD service response.
    pub fn from_design(result: &DesignResult) -> Result<Self> {
        Ok(Self {
            anova_table: required_anova_table(result)?,
            tukey_results: result.tukey_results().cloned().unwrap_or(Value::Null),
            shapiro: required_shapiro(result)?,
            mean_separation_results: result
                .mean_separation_results()
                .cloned()
                .unwrap_or(Value::Null),
            f_oneway_results: result.f_oneway_results().map(text_of).unwrap_or_default(),
            overall_cv: required_cv(result)?,
            cd_value: result.cd_value(),
        })
    }
}

/// Inputs for the FRBD interpretation prompt; results are per factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FrbdSummaryInput {
    pub anova_table: String,
    pub tukey_results: Vec<(String, Value)>,
    pub shapiro: ShapiroResult,
    pub mean_separation_results: Vec<(String, Value)>,
    pub overall_cv: f64,
    pub cd_value: Option<f64>,
}

impl FrbdSummaryInput {
    /// Collect the prompt inputs from an FRBD service response.
    pub fn from_design(result: &DesignResult) -> Result<Self> {
        Ok(Self {
            anova_table: required_anova_table(result)?,
            tukey_results: per_factor(result.tukey_results()),
            shapiro: required_shapiro(result)?,
            mean_separation_results: per_factor(result.mean_separation_results()),
            overall_cv: required_cv(result)?,
            cd_value: result.cd_value(),
        })
    }
}

fn required_anova_table(result: &DesignResult) -> Result<String> {
    result
        .anova_table_text()
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AssistError::InvalidInput("anova_table must be a valid string".to_string()))
}

fn required_shapiro(result: &DesignResult) -> Result<ShapiroResult> {
    result
        .shapiro()
        .ok_or_else(|| AssistError::InvalidInput("shapiro results are missing".to_string()))
}

fn required_cv(result: &DesignResult) -> Result<f64> {
    result
        .overall_cv()
        .ok_or_else(|| AssistError::InvalidInput("overall_cv is missing".to_string()))
}

fn per_factor(value: Option<&Value>) -> Vec<(String, Value)> {
    match value {
        Some(Value::Object(factors)) => factors
            .iter()
            .map(|(factor, results)| (factor.clone(), results.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Scalar as it reads in running text: strings unquoted, integral numbers
/// without a fraction.
fn inline_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number
            .as_f64()
            .map_or_else(|| number.to_string(), format_number),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Render post-hoc or mean-separation results for a prompt.
///
/// Rows carrying a `Significance` or `Group` column (checked on the first
/// row) become `"<first field>: <second field> (<letters>)"` lines. Any other
/// JSON is pretty-printed. Strings are parsed as JSON first and returned
/// verbatim when they are not JSON.
pub fn format_results_with_letters(value: &Value) -> String {
    if let Value::String(text) = value {
        return match serde_json::from_str::<Value>(text) {
            Ok(parsed) => format_parsed(&parsed),
            Err(_) => text.clone(),
        };
    }
    format_parsed(value)
}

fn format_parsed(value: &Value) -> String {
    if let Some(Value::Object(first)) = value.as_array().and_then(|rows| rows.first()) {
        let letters_key = if first.contains_key("Significance") {
            Some("Significance")
        } else if first.contains_key("Group") {
            Some("Group")
        } else {
            None
        };
        if let (Some(letters_key), Some(rows)) = (letters_key, value.as_array()) {
            return rows
                .iter()
                .filter_map(Value::as_object)
                .map(|row| {
                    let mut fields = row.values();
                    let treatment = inline_value(fields.next());
                    let mean = inline_value(fields.next());
                    let letters = inline_value(row.get(letters_key));
                    format!("{treatment}: {mean} ({letters})")
                })
                .collect::<Vec<_>>()
                .join("\n");
        }
    }
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn cd_text(cd_value: Option<f64>) -> String {
    match cd_value {
        Some(cd) if cd.is_finite() && cd != 0.0 => format!("{cd:.4}"),
        _ => "Not available".to_string(),
    }
}

fn reject_empty_anova(anova_table: &str) -> Result<()> {
    if anova_table.trim().is_empty() {
        return Err(AssistError::InvalidInput(
            "anova_table must be a valid string".to_string(),
        ));
    }
    Ok(())
}

fn push_shapiro(prompt: &mut String, shapiro: ShapiroResult) {
    prompt.push_str("3.  **Shapiro-Wilk Test for Normality of Residuals:**\n");
    let _ = writeln!(prompt, "- Statistic: {}", format_number(shapiro.stat));
    let _ = write!(prompt, "- P-value: {}\n\n", format_number(shapiro.p));
}

fn push_per_factor(prompt: &mut String, results: &[(String, Value)]) {
    for (factor, value) in results {
        let _ = writeln!(prompt, "*   **Factor: {factor}**");
        prompt.push_str("    ```\n");
        prompt.push_str(&format_results_with_letters(value));
        prompt.push_str("\n    ```\n");
    }
    prompt.push('\n');
}

fn push_assumptions(prompt: &mut String, design: &str) {
    let _ = writeln!(prompt, "A.  **ASSUMPTIONS OF {design}:**");
    prompt.push_str("- Start with a clear heading: \"Model Assumptions\".\n");
    prompt.push_str("- Based on the Shapiro-Wilk test P-value, conclude whether the model's residuals are normally distributed. A p-value > 0.05 indicates that the residuals are normally distributed, and the assumption is met.\n\n");
}

/// Prompt asking for a beginner-friendly explanation of results.
pub fn explanation_prompt(results: &str, analysis_type: &str) -> String {
    format!(
        "You are an AI assistant that explains statistical results in a way that is easy to understand for people who are new to statistics.\n\n\
         You will be provided with the statistical results and the type of analysis that was performed.\n\n\
         Based on this information, generate an explanation of the statistical results that is clear, concise, and easy to understand.\n\n\
         Statistical Results:\n{results}\n\n\
         Type of Analysis:\n{analysis_type}\n\n\
         Explanation:\n"
    )
}

/// Flatten an analysis result into the text block the explanation prompt
/// quotes, ending with the user's context line.
pub fn results_digest(result: &AnalysisResult, context: Option<&str>) -> String {
    let mut digest = format!("Analysis Title: {}\n", result.title());
    if !result.statistics().is_empty()
        && let Ok(statistics) = serde_json::to_string(result.statistics())
    {
        let _ = writeln!(digest, "Key Statistics: {statistics}");
    }
    if let Some(table) = result.summary_table() {
        let _ = writeln!(digest, "Summary Table: {}", table.headers.join(", "));
        for row in &table.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            let _ = writeln!(digest, "{}", cells.join(", "));
        }
    }
    match result {
        AnalysisResult::Regression(regression) => {
            let coefficients: Vec<String> = regression
                .coefficients
                .iter()
                .map(|c| {
                    format!(
                        "{}: est={}, pval={}",
                        c.term,
                        format_number(c.estimate),
                        format_number(c.p_value)
                    )
                })
                .collect();
            let _ = writeln!(digest, "Regression Coefficients: {}", coefficients.join("; "));
        }
        AnalysisResult::PostHoc(post_hoc) => {
            let comparisons: Vec<String> = post_hoc
                .tests
                .results
                .iter()
                .map(|r| {
                    format!(
                        "{}: diff={}, pval={}",
                        r.comparison,
                        format_number(r.diff),
                        format_number(r.p_value)
                    )
                })
                .collect();
            let _ = writeln!(
                digest,
                "Post-hoc Tests ({}): {}",
                post_hoc.tests.test_name,
                comparisons.join("; ")
            );
        }
        AnalysisResult::Raw(raw) => {
            if let Some(output) = &raw.raw_output {
                let _ = writeln!(digest, "Raw Output: {output}");
            }
        }
        AnalysisResult::Anova(_) | AnalysisResult::Error(_) => {}
    }
    let context = context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(NO_CONTEXT);
    let _ = write!(digest, "\nUser context: {context}");
    digest
}

/// Prompt restricting answers to the knowledge base.
pub fn guidance_prompt(question: &str, knowledge_base: &str) -> String {
    format!(
        "You are a helpful AI assistant for the StatViz application. Your role is to provide clear and accurate guidance on statistical methods for agricultural research.\n\n\
         You MUST base your answers exclusively on the information provided in the \"Knowledge Base\" section below. Do not use any external knowledge or make assumptions. If the answer cannot be found in the knowledge base, state that you do not have information on that topic.\n\n\
         Keep your answers concise and easy to understand for someone new to statistics.\n\n\
         Knowledge Base:\n---\n{knowledge_base}\n---\n\n\
         User's Question:\n\"{question}\"\n\n\
         Answer:\n"
    )
}

/// Interpretation prompt for a Randomized Block Design analysis.
pub fn rbd_summary_prompt(input: &RbdSummaryInput) -> Result<String> {
    reject_empty_anova(&input.anova_table)?;

    let mut prompt = String::from(STATISTICIAN_INTRO);
    prompt.push_str("Your task is to interpret the results of a Randomized Block Design (RBD) analysis and provide a comprehensive, easy-to-understand summary for a researcher. Do not use \"I\" or \"you\" in your interpretations.\n\n");
    prompt.push_str("Here is the data from the analysis:\n\n");
    let _ = write!(
        prompt,
        "1. **ANOVA Table:**\n```json\n{}\n```\n\n",
        input.anova_table
    );
    let _ = write!(
        prompt,
        "2.  **Tukey HSD Post-hoc Test Results:**\n```\n{}\n```\n\n",
        format_results_with_letters(&input.tukey_results)
    );
    push_shapiro(&mut prompt, input.shapiro);
    let _ = write!(
        prompt,
        "4.  **Mean Separation Results (Treatment Means):**\n```\n{}\n```\n\n",
        format_results_with_letters(&input.mean_separation_results)
    );
    let _ = write!(
        prompt,
        "5.  **F-Oneway Results:**\n```json\n{}\n```\n\n",
        input.f_oneway_results
    );
    let _ = write!(
        prompt,
        "6.  **Overall Coefficient of Variation (CV):** {:.2}%\n\n",
        input.overall_cv
    );
    let _ = write!(
        prompt,
        "7.  **Critical Difference (CD) Value:** {}\n\n",
        cd_text(input.cd_value)
    );
    prompt.push_str("--- \n\n");
    prompt.push_str("**Please provide the following in your interpretation:**\n\n");
    prompt.push_str(DISCLAIMER);
    push_assumptions(&mut prompt, "RBD");
    prompt.push_str("B.  **OVERALL MODEL INTERPRETATION:**\n");
    prompt.push_str("- Start with a clear heading: \"Overall Model Interpretation\".\n");
    prompt.push_str("- Based on the ANOVA table, state whether there are any significant differences among the treatments and blocks. Explain what the F-statistic and P-value for the treatment factor mean in this context.\n");
    prompt.push_str(CV_GUIDANCE);
    prompt.push_str("C.  **TREATMENT PERFORMANCE:**\n");
    prompt.push_str("- Start with a clear heading: \"Treatment Performance\".\n");
    prompt.push_str("- Using the Mean Separation Results and Tukey HSD results, identify which treatments performed best.\n");
    prompt.push_str("- List the treatments from best to worst based on their means. Add the standard error of mean (SEM) values to the mean values with plus or minus sign. Add alphabetical letters from mean separation results. eg. \"89.76 \u{b1} 2.50 ab\" \n");
    prompt.push_str("- Clearly explain which treatment means are statistically different from each other and which are not, referencing the significance letters or p-values from the Tukey test.\n\n");
    prompt.push_str("D.  **Conclusion and Recommendations:**\n");
    prompt.push_str("- Start with a clear heading: \"Conclusion and Recommendations\".\n");
    prompt.push_str("- Provide a concise, overall conclusion about the treatment effects.\n");
    prompt.push_str("- Recommend the best-performing treatment(s) for future research or application, based on the statistical evidence.\n\n");
    prompt.push_str(CLOSING);
    Ok(prompt)
}

/// Interpretation prompt for a Factorial Randomized Block Design analysis.
pub fn frbd_summary_prompt(input: &FrbdSummaryInput) -> Result<String> {
    reject_empty_anova(&input.anova_table)?;

    let mut prompt = String::from(STATISTICIAN_INTRO);
    prompt.push_str("Your task is to interpret the results of a Factorial Randomized Block Design (FRBD) analysis and provide a comprehensive, easy-to-understand summary for a researcher. Do not use \"I\" or \"you\" in your interpretations.\n\n");
    prompt.push_str("Here is the data from the analysis:\n\n");
    let _ = write!(
        prompt,
        "1. **ANOVA Table:**\n```json\n{}\n```\n\n",
        input.anova_table
    );
    prompt.push_str("2.  **Tukey HSD Post-hoc Test Results:**\n");
    push_per_factor(&mut prompt, &input.tukey_results);
    push_shapiro(&mut prompt, input.shapiro);
    prompt.push_str("4.  **Mean Separation Results (Treatment Means):**\n");
    push_per_factor(&mut prompt, &input.mean_separation_results);
    let _ = write!(
        prompt,
        "5.  **Overall Coefficient of Variation (CV):** {:.2}%\n\n",
        input.overall_cv
    );
    let _ = write!(
        prompt,
        "6.  **Critical Difference (CD) Value:** {}\n\n",
        cd_text(input.cd_value)
    );
    prompt.push_str("--- \n\n");
    prompt.push_str("**Please provide the following in your interpretation:**\n\n");
    prompt.push_str(DISCLAIMER);
    push_assumptions(&mut prompt, "FRBD");
    prompt.push_str("B.  **OVERALL MODEL INTERPRETATION:**\n");
    prompt.push_str("- Start with a clear heading: \"Overall Model Interpretation\".\n");
    prompt.push_str("- Based on the ANOVA table, state whether there are any significant main effects (for each factor) and interaction effects. Explain what the F-statistic and P-value for each factor and their interaction mean in this context.\n");
    prompt.push_str(CV_GUIDANCE);
    prompt.push_str("C.  **FACTOR PERFORMANCE:**\n");
    prompt.push_str("- Start with a clear heading: \"Factor Performance\".\n");
    prompt.push_str("- For each factor, using the Mean Separation Results and Tukey HSD results, identify which levels performed best.\n");
    prompt.push_str("- List the levels from best to worst based on their means. Add the standard error of mean (SEM) values to the mean values with plus or minus sign. Add alphabetical letters from mean separation results. eg. \"89.76 \u{b1} 2.50 ab\" \n");
    prompt.push_str("- Clearly explain which level means are statistically different from each other and which are not, referencing the significance letters from the Tukey test.\n");
    prompt.push_str("- If the interaction is significant, explain the interaction effect. Describe how the effect of one factor changes across the levels of the other factor.\n\n");
    prompt.push_str("D.  **Conclusion and Recommendations:**\n");
    prompt.push_str("- Start with a clear heading: \"Conclusion and Recommendations\".\n");
    prompt.push_str("- Provide a concise, overall conclusion about the main effects and interaction effects.\n");
    prompt.push_str("- Recommend the best-performing levels or combination of levels for future research or application, based on the statistical evidence.\n\n");
    prompt.push_str(CLOSING);
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn letters_from_significance_column() {
        let rows = json!([
            {"Treatment": "T1", "Mean": 89.76, "Significance": "a"},
            {"Treatment": "T2", "Mean": 75.0, "Significance": "b"}
        ]);
        assert_eq!(format_results_with_letters(&rows), "T1: 89.76 (a)\nT2: 75 (b)");
    }

    #[test]
    fn letters_from_group_column_in_json_string() {
        let text = json!(r#"[{"Variety": "V1", "Yield": 4.2, "Group": "ab"}]"#);
        assert_eq!(format_results_with_letters(&text), "V1: 4.2 (ab)");
    }

    #[test]
    fn non_letter_json_is_pretty_printed() {
        let value = json!({"p-adj": 0.03});
        assert_eq!(format_results_with_letters(&value), "{\n  \"p-adj\": 0.03\n}");
    }

    #[test]
    fn non_json_string_is_returned_verbatim() {
        let value = json!("group1 group2 meandiff");
        assert_eq!(format_results_with_letters(&value), "group1 group2 meandiff");
    }

    #[test]
    fn cd_value_formatting() {
        assert_eq!(cd_text(Some(1.234_56)), "1.2346");
        assert_eq!(cd_text(None), "Not available");
        assert_eq!(cd_text(Some(0.0)), "Not available");
    }

    #[test]
    fn explanation_prompt_quotes_inputs() {
        let prompt = explanation_prompt("F = 4.2", "ANOVA");
        assert!(prompt.contains(
            "Statistical Results:\nF = 4.2\n\nType of Analysis:\nANOVA\n\nExplanation:"
        ));
    }

    #[test]
    fn guidance_prompt_embeds_question_and_knowledge() {
        let prompt = guidance_prompt("What is ANOVA?", "# Guide");
        assert!(prompt.contains("Knowledge Base:\n---\n# Guide\n---"));
        assert!(prompt.contains("User's Question:\n\"What is ANOVA?\""));
        assert!(prompt.contains("do not have information on that topic"));
    }
}
