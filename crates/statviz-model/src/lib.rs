//! Shared data model for StatViz.

pub mod analysis;
pub mod error;
pub mod mapping;
pub mod services;
pub mod table;

pub use analysis::{
    AnalysisResult, AnalysisType, AnovaResult, ErrorResult, PostHocComparison, PostHocResult,
    PostHocTests, RawResult, RegressionCoefficient, RegressionResult, Statistics, SummaryTable,
    TableCell, WireAnalysisResult,
};
pub use error::{ModelError, Result};
pub use mapping::{VariableMapping, VariableRole};
pub use services::{
    DesignResult, MoranStatistic, NO_TRANSFORMATION_NEEDED, NormalityReport, NormalitySummary,
    ProbitResult, ShapiroResult, SpatialResult, TransformPayload, clean_factor_name,
};
pub use table::{CellValue, ColumnDefinition, ColumnKind, DataRow, Dataset, format_number};
