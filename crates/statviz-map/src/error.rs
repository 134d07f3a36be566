//! Error types for role assignment.

use thiserror::Error;

/// Errors from role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// Column not present in the dataset.
    #[error("column '{column}' not found{}", did_you_mean(suggestion.as_deref()))]
    ColumnNotFound {
        column: String,
        suggestion: Option<String>,
    },
}

fn did_you_mean(suggestion: Option<&str>) -> String {
    suggestion
        .map(|name| format!(" (did you mean '{name}'?)"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, MappingError>;
