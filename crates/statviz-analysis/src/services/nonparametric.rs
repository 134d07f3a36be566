use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::Form;
use serde_json::Value;
use tracing::{debug, info};

use super::{UploadFile, normalize_url};
use crate::error::{AnalysisError, Result};
use crate::http::{build_client, read_json_or, send};

/// Service used when no URL is configured.
pub const DEFAULT_NONPARAMETRIC_URL: &str = "http://127.0.0.1:8080/nonp/analyze";

const FALLBACK_ERROR: &str = "Backend analysis failed.";

/// Number of groups being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupCount {
    One,
    Two,
    MoreThanTwo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDesign {
    Independent,
    Paired,
}

/// Measurement scale of the dependent variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureScale {
    Continuous,
    Ordinal,
    Nominal,
    /// Nominal with exactly two categories.
    BinaryNominal,
}

/// Tests offered by the non-parametric service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonParametricTest {
    ChiSquareGoodnessOfFit,
    MannWhitneyU,
    KruskalWallis,
    ChiSquareIndependence,
    WilcoxonSignedRank,
    McNemar,
    Friedman,
}

impl NonParametricTest {
    pub const ALL: [Self; 7] = [
        Self::ChiSquareGoodnessOfFit,
        Self::MannWhitneyU,
        Self::KruskalWallis,
        Self::ChiSquareIndependence,
        Self::WilcoxonSignedRank,
        Self::McNemar,
        Self::Friedman,
    ];

    /// Identifier sent as `test_type`.
    pub fn key(self) -> &'static str {
        match self {
            Self::ChiSquareGoodnessOfFit => "chi_square_goodness_of_fit",
            Self::MannWhitneyU => "mann_whitney_u",
            Self::KruskalWallis => "kruskal_wallis",
            Self::ChiSquareIndependence => "chi_square_independence",
            Self::WilcoxonSignedRank => "wilcoxon_signed_rank",
            Self::McNemar => "mcnemar",
            Self::Friedman => "friedman",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ChiSquareGoodnessOfFit => "Chi-square goodness of fit",
            Self::MannWhitneyU => "Mann-Whitney U test",
            Self::KruskalWallis => "Kruskal-Wallis",
            Self::ChiSquareIndependence => "Chi-square (or Fisher's exact)",
            Self::WilcoxonSignedRank => "Wilcoxon signed-rank",
            Self::McNemar => "McNemar's test",
            Self::Friedman => "Friedman test",
        }
    }

    /// How the uploaded CSV must be laid out for this test.
    pub fn data_format(self) -> &'static str {
        match self {
            Self::ChiSquareGoodnessOfFit => {
                "Your data should be in a single column representing the observed frequencies \
                 for each category. Optionally, a second column can be provided for expected \
                 frequencies. If no expected frequencies are given, they will be assumed to be \
                 equal."
            }
            Self::MannWhitneyU => {
                "Your CSV data should have exactly two columns, one for each independent group."
            }
            Self::KruskalWallis => {
                "Your CSV data should have two or more columns, with each column representing a \
                 different group for comparison."
            }
            Self::ChiSquareIndependence => {
                "Your data should be a contingency table in CSV format (e.g., a 2x2 table \
                 representing observed frequencies). The file should not contain headers or \
                 index columns."
            }
            Self::WilcoxonSignedRank => {
                "Your CSV data should have exactly two columns for paired data (e.g., 'before' \
                 and 'after' values for the same set of subjects)."
            }
            Self::McNemar => {
                "Requires a 2x2 contingency table in CSV format representing paired nominal data."
            }
            Self::Friedman => {
                "Your CSV data should have at least three columns, where each column represents \
                 a repeated measure on the same subjects."
            }
        }
    }
}

impl fmt::Display for NonParametricTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NonParametricTest {
    type Err = AnalysisError;

    /// Accepts the service key, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|test| test.key() == key)
            .ok_or_else(|| AnalysisError::InvalidRequest(format!("Invalid test name: {s}")))
    }
}

/// Pick a test from the study layout.
///
/// The sample design is ignored for a single group. Returns `None` when no
/// test fits the combination.
pub fn recommend_test(
    groups: GroupCount,
    design: SampleDesign,
    scale: MeasureScale,
) -> Option<NonParametricTest> {
    use MeasureScale::{BinaryNominal, Continuous, Nominal, Ordinal};
    use NonParametricTest as T;
    use SampleDesign::{Independent, Paired};

    match (groups, design, scale) {
        (GroupCount::One, _, Nominal) => Some(T::ChiSquareGoodnessOfFit),
        (GroupCount::Two, Independent, Continuous | Ordinal) => Some(T::MannWhitneyU),
        (GroupCount::Two, Independent, BinaryNominal) => Some(T::ChiSquareIndependence),
        (GroupCount::Two, Paired, Continuous | Ordinal) => Some(T::WilcoxonSignedRank),
        (GroupCount::Two, Paired, BinaryNominal) => Some(T::McNemar),
        (GroupCount::MoreThanTwo, Independent, Continuous | Ordinal) => Some(T::KruskalWallis),
        (GroupCount::MoreThanTwo, Paired, Continuous | Ordinal) => Some(T::Friedman),
        _ => None,
    }
}

/// Client for the non-parametric test service, which takes the data file
/// itself.
#[derive(Debug, Clone)]
pub struct NonParametricClient {
    url: Option<String>,
    client: Client,
}

impl NonParametricClient {
    pub fn new(url: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: normalize_url(url),
            client: build_client(timeout)?,
        })
    }

    pub fn analyze(&self, test: NonParametricTest, file: &UploadFile) -> Result<Value> {
        let url = self.url.as_deref().ok_or(AnalysisError::ServiceNotConfigured {
            service: "non-parametric",
        })?;
        let form = Form::new()
            .text("test_type", test.key())
            .part("file", file.part()?);

        let start = Instant::now();
        debug!(url, test = test.key(), bytes = file.bytes.len(), "posting non-parametric test");
        let (status, body) = send(url, self.client.post(url).multipart(form))?;
        let result = read_json_or(url, status, &body, FALLBACK_ERROR)?;
        info!(
            url,
            test = test.key(),
            duration_ms = start.elapsed().as_millis(),
            "non-parametric test complete"
        );
        Ok(result)
    }
}
