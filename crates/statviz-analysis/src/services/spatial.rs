use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use statviz_model::{CellValue, DataRow, MoranStatistic, SpatialResult};

use super::normalize_url;
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, decode, read_json, send};

/// Dataset columns feeding the spatial service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialColumns {
    pub location: String,
    pub value: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// One row in the service's fixed column naming. Absent cells are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialPoint {
    #[serde(rename = "LOCATION", skip_serializing_if = "Option::is_none")]
    pub location: Option<CellValue>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<CellValue>,
}

pub fn spatial_points(rows: &[DataRow], columns: &SpatialColumns) -> Vec<SpatialPoint> {
    let pick = |row: &DataRow, column: Option<&str>| column.and_then(|c| row.get(c)).cloned();
    rows.iter()
        .map(|row| SpatialPoint {
            location: pick(row, Some(&columns.location)),
            value: pick(row, Some(&columns.value)),
            latitude: pick(row, columns.latitude.as_deref()),
            longitude: pick(row, columns.longitude.as_deref()),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SpatialClient {
    url: Option<String>,
    client: Client,
}

impl SpatialClient {
    pub fn new(url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: normalize_url(url),
            client: build_client(timeout)?,
        })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Post `{ data }` with rows renamed to the service's columns.
    pub fn analyze(&self, rows: &[DataRow], columns: &SpatialColumns) -> Result<SpatialResult> {
        let url = self
            .url
            .as_deref()
            .ok_or(AnalysisError::ServiceNotConfigured { service: "Spatial" })?;
        let start = Instant::now();
        let points = spatial_points(rows, columns);
        debug!(url, points = points.len(), "posting spatial request");

        let request = self.client.post(url).json(&json!({ "data": points }));
        let (status, body) = send(url, request)?;
        let result: SpatialResult = decode(url, read_json(url, status, &body)?)?;
        info!(
            url,
            moran = result.moran_i.is_some(),
            plots = result.plots.as_ref().map_or(0, |p| p.len()),
            duration_ms = start.elapsed().as_millis(),
            "spatial analysis complete"
        );
        Ok(result)
    }
}

/// Plain-language reading of a Moran's I result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoranInterpretation {
    pub autocorrelation: String,
    pub significance: String,
}

pub fn interpret_moran(statistic: &MoranStatistic) -> MoranInterpretation {
    let pattern = if statistic.i > 0.0 {
        "positive spatial autocorrelation (similar values cluster together)."
    } else if statistic.i < 0.0 {
        "negative spatial autocorrelation (neighboring values are dissimilar)."
    } else {
        "no discernible pattern (spatial randomness)."
    };
    let significance = if statistic.p_value < 0.05 {
        "the observed spatial pattern is statistically significant and is unlikely to be due to random chance."
    } else {
        "the observed spatial pattern is not statistically significant, so randomness cannot be ruled out."
    };
    MoranInterpretation {
        autocorrelation: format!(
            "Based on the calculated Moran's I value of {:.4}, the data exhibits {pattern}",
            statistic.i
        ),
        significance: format!(
            "With a p-value of {:.4}, {significance}",
            statistic.p_value
        ),
    }
}
