use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use serde_json::Value;
use tracing::{debug, info};

use super::{UploadFile, normalize_url};
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, read_json_or, send};

/// Client for the survival service: the data file plus the covariates to
/// adjust for.
#[derive(Debug, Clone)]
pub struct SurvivalClient {
    url: Option<String>,
    client: Client,
}

impl SurvivalClient {
    pub fn new(url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: normalize_url(url),
            client: build_client(timeout)?,
        })
    }

    pub fn analyze(&self, file: &UploadFile, covariates: &[String]) -> Result<Value> {
        let url = self
            .url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "survival" })?;
        let form = covariates
            .iter()
            .fold(Form::new().part("file", file.part()?), |form, covariate| {
                form.text("covariates[]", covariate.clone())
            });

        let start = Instant::now();
        debug!(url, file = %file.name, covariates = covariates.len(), "posting survival request");
        let (status, body) = send(url, self.client.post(url).multipart(form))?;
        let result = read_json_or(url, status, &body, "Analysis failed")?;
        info!(url, duration_ms = start.elapsed().as_millis(), "survival analysis complete");
        Ok(result)
    }
}
