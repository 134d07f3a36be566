//! Error types for configuration, the registry and the wizard.

use std::path::PathBuf;

use thiserror::Error;

use crate::wizard::WizardStep;

#[derive(Debug, Error)]
pub enum CoreError {
    // === Configuration ===
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid value for {name}: {message}")]
    InvalidSetting { name: String, message: String },

    // === Registry ===
    #[error("service registry is already initialized")]
    AlreadyInitialized,

    // === Wizard ===
    /// A step guard refused to advance.
    #[error("cannot leave step {step}: {reason}")]
    StepBlocked { step: WizardStep, reason: String },

    // === Wrapped ===
    #[error(transparent)]
    Ingest(#[from] statviz_ingest::IngestError),

    #[error(transparent)]
    Mapping(#[from] statviz_map::MappingError),

    #[error(transparent)]
    Analysis(#[from] statviz_analysis::AnalysisError),

    #[error(transparent)]
    Assist(#[from] statviz_assist::AssistError),
}

impl CoreError {
    /// Returns a user-friendly error message suitable for inline display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::StepBlocked { reason, .. } => reason.clone(),
            Self::Ingest(err) => err.user_message(),
            Self::Analysis(err) => err.user_message(),
            Self::Assist(err) => err.user_message(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
