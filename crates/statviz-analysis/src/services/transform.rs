use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde_json::json;
use tracing::{debug, info};

use statviz_model::{DataRow, NormalityReport, TransformPayload};

use super::normalize_url;
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, decode, read_json, send};

/// Client for the normality screening and transformation services.
#[derive(Debug, Clone)]
pub struct TransformClient {
    analyze_url: Option<String>,
    apply_url: Option<String>,
    client: Client,
}

impl TransformClient {
    pub fn new(
        analyze_url: Option<&str>,
        apply_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            analyze_url: normalize_url(analyze_url),
            apply_url: normalize_url(apply_url),
            client: build_client(timeout)?,
        })
    }

    /// Screen `response_col` for normality and get a recommended transform.
    pub fn analyze(&self, rows: &[DataRow], response_col: &str) -> Result<NormalityReport> {
        let url = self
            .analyze_url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured {
                service: "Transform analysis",
            })?;
        let start = Instant::now();
        debug!(url, response_col, rows = rows.len(), "posting normality request");
        let request = self
            .client
            .post(url)
            .json(&json!({ "data": rows, "response_col": response_col }));
        let (status, body) = send(url, request)?;
        let report: NormalityReport = decode(url, read_json(url, status, &body)?)?;
        info!(
            url,
            recommendation = report.recommendation.as_deref().unwrap_or("-"),
            duration_ms = start.elapsed().as_millis(),
            "normality screening complete"
        );
        Ok(report)
    }

    /// Apply `transform_choice` to `response_col`.
    pub fn apply(
        &self,
        rows: &[DataRow],
        response_col: &str,
        transform_choice: &str,
    ) -> Result<TransformPayload> {
        let url = self
            .apply_url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured {
                service: "Transform",
            })?;
        let start = Instant::now();
        debug!(url, response_col, transform_choice, "posting transform request");
        let request = self.client.post(url).json(&json!({
            "data": rows,
            "response_col": response_col,
            "transform_choice": transform_choice,
        }));
        let (status, body) = send(url, request)?;
        let payload: TransformPayload = decode(url, read_json(url, status, &body)?)?;
        info!(
            url,
            transformed_col = %payload.transformed_response_col,
            duration_ms = start.elapsed().as_millis(),
            "transform applied"
        );
        Ok(payload)
    }
}
