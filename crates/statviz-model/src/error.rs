use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown analysis type: {0}")]
    UnknownAnalysisType(String),
    #[error("unknown variable role: {0}")]
    UnknownRole(String),
    #[error("invalid service payload: {0}")]
    InvalidPayload(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
