use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use serde_json::Value;
use tracing::{debug, info};

use statviz_model::DataRow;

use super::{normalize_url, require, rows_json};
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, read_json, read_json_or, send};

/// Service used when no BLUP URL is configured.
pub const DEFAULT_BLUP_URL: &str = "http://127.0.0.1:8080/blup";

const LMM_ANALYSIS_TYPE: &str = "effects";

/// Columns for a linear mixed model with a random grouping effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmmRequest {
    pub response_col: String,
    pub group_col: String,
    pub fixed_effects: Vec<String>,
    /// Fixed effect whose levels get Tukey comparisons.
    pub tukey_factor: String,
}

/// Column mapping for a multi-environment BLUP analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlupRequest {
    pub dependent_var: String,
    pub genotype_var: String,
    pub rep_var: String,
    pub block_var: String,
    pub env_var: String,
    pub year_var: String,
}

impl BlupRequest {
    pub fn validate(&self) -> Result<()> {
        let mapped = [
            &self.dependent_var,
            &self.genotype_var,
            &self.env_var,
            &self.year_var,
            &self.rep_var,
            &self.block_var,
        ];
        if mapped.iter().any(|column| column.trim().is_empty()) {
            return Err(AnalysisError::InvalidRequest(
                "Please select all required column mappings (Dependent, Genotype, Environment, \
                 Year, Replication, Block)."
                    .to_string(),
            ));
        }
        if self.genotype_var == self.rep_var {
            return Err(AnalysisError::InvalidRequest(
                "Genotype and Replication columns cannot be the same.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Client for the mixed-model services: LMM effects and BLUP.
#[derive(Debug, Clone)]
pub struct MixedModelClient {
    lmm_url: Option<String>,
    blup_url: Option<String>,
    client: Client,
}

impl MixedModelClient {
    pub fn new(lmm_url: Option<&str>, blup_url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            lmm_url: normalize_url(lmm_url),
            blup_url: normalize_url(blup_url),
            client: build_client(timeout)?,
        })
    }

    pub fn lmm(&self, rows: &[DataRow], request: &LmmRequest) -> Result<Value> {
        let url = self
            .lmm_url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "LMM" })?;
        require("response column", &request.response_col)?;
        require("group column", &request.group_col)?;
        let form = Form::new()
            .text("data", rows_json(rows)?)
            .text("analysis_type", LMM_ANALYSIS_TYPE)
            .text("response_col", request.response_col.clone())
            .text("group_col", request.group_col.clone())
            .text("fixed_effects", request.fixed_effects.join(","))
            .text("tukey_factor", request.tukey_factor.clone());

        let start = Instant::now();
        debug!(url, rows = rows.len(), "posting LMM request");
        let (status, body) = send(url, self.client.post(url).multipart(form))?;
        let result = read_json_or(url, status, &body, "Analysis failed")?;
        info!(url, duration_ms = start.elapsed().as_millis(), "LMM analysis complete");
        Ok(result)
    }

    /// A non-success status reports the body text; a success body with an
    /// `error` field is still a failure.
    pub fn blup(&self, rows: &[DataRow], request: &BlupRequest) -> Result<Value> {
        let url = self
            .blup_url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "BLUP" })?;
        request.validate()?;
        let form = Form::new()
            .text("data", rows_json(rows)?)
            .text("dependent_var", request.dependent_var.clone())
            .text("genotype_var", request.genotype_var.clone())
            .text("rep_var", request.rep_var.clone())
            .text("block_var", request.block_var.clone())
            .text("env_var", request.env_var.clone())
            .text("year_var", request.year_var.clone());

        let start = Instant::now();
        debug!(url, rows = rows.len(), "posting BLUP request");
        let (status, body) = send(url, self.client.post(url).multipart(form))?;
        if !status.is_success() {
            let text = body.trim();
            let message = if text.is_empty() {
                format!("Analysis failed ({})", status.as_u16())
            } else {
                text.to_string()
            };
            return Err(AnalysisError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        let result = read_json(url, status, &body)?;
        if let Some(error) = result.get("error").filter(|error| !error.is_null()) {
            let message = error.as_str().map_or_else(|| error.to_string(), str::to_string);
            return Err(AnalysisError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        info!(url, duration_ms = start.elapsed().as_millis(), "BLUP analysis complete");
        Ok(result)
    }
}
