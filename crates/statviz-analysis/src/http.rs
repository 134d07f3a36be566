//! Shared blocking HTTP plumbing for backends and service clients.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::{AnalysisError, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Bytes of a non-JSON body quoted in errors.
const BODY_SNIPPET_CHARS: usize = 300;

const USER_AGENT_VALUE: &str = concat!("statviz/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT_VALUE)
        .build()
        .map_err(|e| AnalysisError::Client(e.to_string()))
}

/// Send a request and read the whole body as text.
pub(crate) fn send(url: &str, request: RequestBuilder) -> Result<(StatusCode, String)> {
    let response = request.send().map_err(|e| AnalysisError::Connection {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let status = response.status();
    let body = response.text().map_err(|e| AnalysisError::Connection {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    tracing::debug!(url, status = status.as_u16(), bytes = body.len(), "response received");
    Ok((status, body))
}

/// Parse a service body as JSON, turning error statuses into errors.
///
/// A non-success status uses the body's `error` field as the message when
/// present.
pub(crate) fn read_json(url: &str, status: StatusCode, body: &str) -> Result<Value> {
    let fallback = format!("Analysis failed ({})", status.as_u16());
    read_json_or(url, status, body, &fallback)
}

/// [`read_json`] with a service-specific message for error bodies that
/// carry no `error` field.
pub(crate) fn read_json_or(
    url: &str,
    status: StatusCode,
    body: &str,
    fallback: &str,
) -> Result<Value> {
    let value: Value = serde_json::from_str(body).map_err(|_| AnalysisError::UnexpectedResponse {
        status: status.as_u16(),
        body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
    })?;
    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string();
        return Err(AnalysisError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        });
    }
    Ok(value)
}

/// Decode a JSON value into a typed payload.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(url: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AnalysisError::InvalidResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_body_is_quoted() {
        let body = "<html>".repeat(100);
        let err = read_json("http://svc", StatusCode::BAD_GATEWAY, &body).expect_err("html");
        match err {
            AnalysisError::UnexpectedResponse { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.chars().count(), BODY_SNIPPET_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_field_becomes_message() {
        let err = read_json(
            "http://svc",
            StatusCode::BAD_REQUEST,
            r#"{"error": "Missing column: Value"}"#,
        )
        .expect_err("bad request");
        assert_eq!(err.user_message(), "Missing column: Value");

        let err = read_json("http://svc", StatusCode::INTERNAL_SERVER_ERROR, "{}")
            .expect_err("server error");
        assert_eq!(err.user_message(), "Analysis failed (500)");
    }

    #[test]
    fn fallback_message_without_error_field() {
        let err = read_json_or(
            "http://svc",
            StatusCode::BAD_REQUEST,
            r#"{"detail": "nope"}"#,
            "Backend analysis failed.",
        )
        .expect_err("bad request");
        assert_eq!(err.user_message(), "Backend analysis failed.");
    }
}
