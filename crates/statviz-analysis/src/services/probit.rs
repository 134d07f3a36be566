use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use tracing::{debug, info};

use statviz_model::ProbitResult;

use super::{UploadFile, normalize_url};
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, read_json_or, send};

/// Client for the probit dose-response service.
#[derive(Debug, Clone)]
pub struct ProbitClient {
    url: Option<String>,
    client: Client,
}

impl ProbitClient {
    pub fn new(url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: normalize_url(url),
            client: build_client(timeout)?,
        })
    }

    pub fn analyze(&self, file: &UploadFile) -> Result<ProbitResult> {
        let url = self
            .url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "probit" })?;
        let form = Form::new().part("file", file.part()?);

        let start = Instant::now();
        debug!(url, file = %file.name, "posting probit request");
        let (status, body) = send(url, self.client.post(url).multipart(form))?;
        let raw = read_json_or(url, status, &body, "Analysis failed")?;
        let result = ProbitResult::from_response(raw);
        info!(
            url,
            profile_likelihood = result.profile_likelihood.is_some(),
            duration_ms = start.elapsed().as_millis(),
            "probit analysis complete"
        );
        Ok(result)
    }
}
