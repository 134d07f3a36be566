//! Error types for prompt construction and text generation.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssistError {
    // === Input ===
    /// A prompt could not be built from the given inputs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // === Provider ===
    /// No API key was configured for the hosted model.
    #[error("no API key configured for the language model")]
    MissingApiKey,

    /// Failed to build the HTTP client.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The request never got a response.
    #[error("request to language model failed: {0}")]
    Connection(String),

    /// The provider answered with a non-success status.
    #[error("language model returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider answered but the body could not be read.
    #[error("invalid response from language model: {0}")]
    InvalidResponse(String),

    /// The provider answered without any text.
    #[error("language model returned no text")]
    EmptyResponse,
}

impl AssistError {
    /// Returns a user-friendly error message suitable for inline display.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::MissingApiKey => {
                "No API key configured. Set GEMINI_API_KEY or llm.api_key in the config file."
                    .to_string()
            }
            Self::Client(_) | Self::Connection(_) => {
                "Could not reach the language model. Check your network connection.".to_string()
            }
            Self::Status { status, message } => {
                format!("The language model rejected the request ({status}): {message}")
            }
            Self::InvalidResponse(_) | Self::EmptyResponse => {
                "The language model returned an unreadable answer.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistError>;
