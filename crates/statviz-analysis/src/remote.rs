//! HTTP analysis backend.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use statviz_model::AnalysisResult;

use crate::backend::{AnalysisBackend, AnalysisRequest};
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, send};

/// Backend address used when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5001/analyze";

/// Posts `{ data, variables, analysisType }` and decodes the JSON answer.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            client: build_client(timeout)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AnalysisBackend for HttpBackend {
    fn name(&self) -> &str {
        "remote"
    }

    fn endpoint(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        debug!(
            url = %self.url,
            analysis = %request.analysis_type,
            rows = request.data.len(),
            "posting analysis request"
        );
        let (status, body) = send(&self.url, self.client.post(&self.url).json(request))?;
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "backend returned an error");
            return Err(AnalysisError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                message: format!("Backend returned an error: {status}"),
            });
        }
        serde_json::from_str(&body).map_err(|e| AnalysisError::InvalidResponse {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}
