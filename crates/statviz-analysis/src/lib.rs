//! Analysis dispatch for StatViz.
//!
//! Results come from a [`MockBackend`] or an [`HttpBackend`] through
//! [`dispatch`], which never fails. The auxiliary services (spatial, block
//! designs, transformations, mixed models, non-parametric tests, survival
//! and probit) have their own clients, and [`quality`] holds the local
//! data-quality screens.

pub mod backend;
pub mod error;
pub mod http;
pub mod mock;
pub mod quality;
pub mod remote;
pub mod services;
pub mod tracker;

pub use backend::{AnalysisBackend, AnalysisRequest, dispatch};
pub use error::{AnalysisError, Result};
pub use http::{DEFAULT_TIMEOUT, build_client};
pub use mock::{ANOVA_HEADERS, MockBackend};
pub use quality::{
    Descriptive, HistogramBin, KsResult, LeveneResult, describe, erf, histogram, ks_normality,
    levene, levene_by_column,
};
pub use remote::{DEFAULT_BACKEND_URL, HttpBackend};
pub use services::{
    BlupRequest, CONVERTED_SHEET_NAME, DEFAULT_BLUP_URL, DEFAULT_NONPARAMETRIC_URL, DesignClient,
    FrbdRequest, GroupCount, LmmRequest, MeasureScale, MixedModelClient, MoranInterpretation,
    NonParametricClient, NonParametricTest, ProbitClient, RbdRequest, SampleDesign, SpatialClient,
    SpatialColumns, SpatialPoint, SurvivalClient, TransformClient, UploadFile, interpret_moran,
    recommend_test, spatial_points,
};
pub use tracker::{RequestTicket, RequestTracker};
