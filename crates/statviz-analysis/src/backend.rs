//! Analysis backends and the never-failing dispatch entry point.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use statviz_model::{AnalysisResult, AnalysisType, DataRow, VariableMapping};

use crate::error::Result;

/// Body posted to an analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub data: Vec<DataRow>,
    pub variables: VariableMapping,
    pub analysis_type: AnalysisType,
}

impl AnalysisRequest {
    pub fn new(
        data: Vec<DataRow>,
        variables: VariableMapping,
        analysis_type: AnalysisType,
    ) -> Self {
        Self {
            data,
            variables,
            analysis_type,
        }
    }
}

/// A source of analysis results.
pub trait AnalysisBackend {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Where requests go, if remote.
    fn endpoint(&self) -> Option<&str> {
        None
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult>;
}

/// Run `request` against `backend`, folding any failure into an error result.
pub fn dispatch(backend: &dyn AnalysisBackend, request: &AnalysisRequest) -> AnalysisResult {
    let start = Instant::now();
    match backend.analyze(request) {
        Ok(result) => {
            info!(
                backend = backend.name(),
                analysis = %request.analysis_type,
                rows = request.data.len(),
                duration_ms = start.elapsed().as_millis(),
                "analysis complete"
            );
            result
        }
        Err(err) => {
            warn!(
                backend = backend.name(),
                analysis = %request.analysis_type,
                error = %err,
                "analysis failed"
            );
            let location = backend.endpoint().unwrap_or_else(|| backend.name());
            AnalysisResult::failure(
                request.analysis_type,
                format!(
                    "Could not connect to the analysis backend at {location}. \
                     Please ensure the backend server is running and accessible."
                ),
                err.to_string(),
            )
        }
    }
}
