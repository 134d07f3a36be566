//! Clients for the auxiliary analysis services.

use reqwest::blocking::multipart::Part;

use statviz_model::DataRow;

use crate::error::{AnalysisError, Result};

mod design;
mod mixed;
mod nonparametric;
mod probit;
mod spatial;
mod survival;
mod transform;

pub use design::{DesignClient, FrbdRequest, RbdRequest};
pub use mixed::{BlupRequest, DEFAULT_BLUP_URL, LmmRequest, MixedModelClient};
pub use nonparametric::{
    DEFAULT_NONPARAMETRIC_URL, GroupCount, MeasureScale, NonParametricClient, NonParametricTest,
    SampleDesign, recommend_test,
};
pub use probit::ProbitClient;
pub use spatial::{
    MoranInterpretation, SpatialClient, SpatialColumns, SpatialPoint, interpret_moran,
    spatial_points,
};
pub use survival::SurvivalClient;
pub use transform::TransformClient;

/// Name given to worksheets converted to CSV before upload.
pub const CONVERTED_SHEET_NAME: &str = "upload.csv";

/// A data file forwarded as the multipart `file` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// CSV text converted from a worksheet.
    pub fn converted_sheet(csv: String) -> Self {
        Self::new(CONVERTED_SHEET_NAME, csv.into_bytes())
    }

    pub(crate) fn part(&self) -> Result<Part> {
        if self.bytes.is_empty() {
            return Err(AnalysisError::InvalidRequest(format!("{} is empty", self.name)));
        }
        Ok(Part::bytes(self.bytes.clone()).file_name(self.name.clone()))
    }
}

pub(crate) fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AnalysisError::InvalidRequest(format!("{name} must be selected")));
    }
    Ok(())
}

pub(crate) fn rows_json(rows: &[DataRow]) -> Result<String> {
    serde_json::to_string(rows).map_err(|e| AnalysisError::InvalidRequest(e.to_string()))
}

/// Trim a configured URL; blank means unconfigured.
pub(crate) fn normalize_url(url: Option<&str>) -> Option<String> {
    url.map(|u| u.trim().trim_end_matches('/'))
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}
