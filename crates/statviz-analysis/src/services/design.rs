use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use tracing::{debug, info};

use statviz_model::{DataRow, DesignResult};

use super::{normalize_url, require, rows_json};
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, read_json, send};

/// Columns for a randomized complete block design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RbdRequest {
    pub block_col: String,
    pub factor_col: String,
    pub response_col: String,
}

/// Columns for a factorial randomized block design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrbdRequest {
    pub block_col: String,
    pub factor_cols: Vec<String>,
    pub response_col: String,
}

/// Client for the RBD and FRBD services, which take multipart forms.
#[derive(Debug, Clone)]
pub struct DesignClient {
    rbd_url: Option<String>,
    frbd_url: Option<String>,
    client: Client,
}

impl DesignClient {
    pub fn new(rbd_url: Option<&str>, frbd_url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rbd_url: normalize_url(rbd_url),
            frbd_url: normalize_url(frbd_url),
            client: build_client(timeout)?,
        })
    }

    pub fn rbd(&self, rows: &[DataRow], request: &RbdRequest) -> Result<DesignResult> {
        let url = self
            .rbd_url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "RBD" })?;
        require("block column", &request.block_col)?;
        require("factor column", &request.factor_col)?;
        require("response column", &request.response_col)?;
        let form = Form::new()
            .text("data", rows_json(rows)?)
            .text("block_col", request.block_col.clone())
            .text("factor_col", request.factor_col.clone())
            .text("response_col", request.response_col.clone());
        self.post(url, "rbd", rows.len(), form)
    }

    pub fn frbd(&self, rows: &[DataRow], request: &FrbdRequest) -> Result<DesignResult> {
        let url = self
            .frbd_url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "FRBD" })?;
        require("block column", &request.block_col)?;
        require("response column", &request.response_col)?;
        if request.factor_cols.len() < 2 {
            return Err(AnalysisError::InvalidRequest(
                "a factorial design needs at least two factor columns".to_string(),
            ));
        }
        for factor in &request.factor_cols {
            require("factor column", factor)?;
        }
        let form = Form::new()
            .text("data", rows_json(rows)?)
            .text("block_col", request.block_col.clone())
            .text("factor_cols", request.factor_cols.join(","))
            .text("response_col", request.response_col.clone());
        self.post(url, "frbd", rows.len(), form)
    }

    fn post(&self, url: &str, design: &str, rows: usize, form: Form) -> Result<DesignResult> {
        let start = Instant::now();
        debug!(url, design, rows, "posting design request");
        let (status, body) = send(url, self.client.post(url).multipart(form))?;
        let result = DesignResult::new(read_json(url, status, &body)?);
        info!(
            url,
            design,
            duration_ms = start.elapsed().as_millis(),
            "design analysis complete"
        );
        Ok(result)
    }
}
