//! Client for the hosted Gemini `generateContent` endpoint.
//!
//! Blocking, single-shot: one prompt in, the concatenated text parts of the
//! first candidate out. No streaming and no retries.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::error::{AssistError, Result};
use crate::provider::{GenerationRequest, TextGenerator};

/// Public API base URL.
pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT_VALUE: &str = concat!("statviz/", env!("CARGO_PKG_VERSION"));

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// [`TextGenerator`] backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
}

impl GeminiGenerator {
    /// Creates a client authenticating with `api_key`.
    ///
    /// A blank key is rejected up front so that a missing configuration is
    /// reported before any prompt is built.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AssistError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| AssistError::Client("API key contains invalid characters".to_string()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AssistError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    /// Points the client at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

impl TextGenerator for GeminiGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.endpoint(&request.model);
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
        };

        tracing::debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "sending prompt"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| AssistError::Connection(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| AssistError::Connection(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(AssistError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| AssistError::InvalidResponse(e.to_string()))?;
        let answer: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if answer.trim().is_empty() {
            return Err(AssistError::EmptyResponse);
        }
        Ok(answer)
    }
}
