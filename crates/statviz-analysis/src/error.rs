//! Error types for analysis dispatch and service calls.

use thiserror::Error;

/// Errors from backends and external analysis services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// The service URL is missing from configuration.
    #[error("{service} service URL is not configured")]
    ServiceNotConfigured { service: &'static str },

    /// Failed to build the HTTP client.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request never got a response.
    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },

    /// Non-success status from the service.
    #[error("{url} returned {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Response body is not JSON.
    #[error("unexpected response from server (status {status}). Body: {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// Response is JSON but not the expected shape.
    #[error("invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// The request could not be built from the inputs.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AnalysisError {
    /// Returns a user-friendly error message suitable for inline display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ServiceNotConfigured { .. }
            | Self::UnexpectedResponse { .. }
            | Self::InvalidRequest(_) => self.to_string(),
            Self::Status { message, .. } => message.clone(),
            Self::Connection { url, .. } => format!(
                "Could not connect to {url}. Please ensure the service is running and accessible."
            ),
            Self::Client(_) | Self::InvalidResponse { .. } => {
                "Analysis failed: the service response could not be read.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
