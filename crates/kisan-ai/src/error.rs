//! Error types for kisan-ai

use thiserror::Error;

/// Result type alias using kisan-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to an upstream provider
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    /// No API key configured for a provider
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    /// Request was aborted by the caller
    #[error("Request aborted")]
    Aborted,

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Build an API error from a non-success response body.
    ///
    /// Providers wrap their message as `{"error": {"message": ...}}`; anything
    /// else is passed through as raw text.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    trimmed.to_string()
                }
            });
        Self::api(status, message)
    }

    /// Check if this error means the user cancelled the request
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// Check if this error is an authentication problem
    pub fn is_auth(&self) -> bool {
        match self {
            Error::MissingApiKey(_) => true,
            Error::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

/// Read a failed response into an [`Error::Api`].
pub(crate) async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::from_body(status, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_extracts_nested_message() {
        let e = Error::from_body(400, r#"{"error":{"message":"Invalid model","type":"invalid_request_error"}}"#);
        match e {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid model");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_body_raw_text() {
        let e = Error::from_body(502, "  bad gateway \n");
        assert_eq!(e.to_string(), "API error: bad gateway (status: 502)");
    }

    #[test]
    fn test_from_body_empty() {
        let e = Error::from_body(500, "");
        assert_eq!(e.to_string(), "API error: HTTP 500 (status: 500)");
    }

    #[test]
    fn test_is_auth() {
        assert!(Error::MissingApiKey("GROQ_API_KEY").is_auth());
        assert!(Error::api(401, "Invalid API key").is_auth());
        assert!(!Error::api(429, "Too many requests").is_auth());
        assert!(!Error::Aborted.is_auth());
    }

    #[test]
    fn test_is_aborted() {
        assert!(Error::Aborted.is_aborted());
        assert!(!Error::Sse("reset".into()).is_aborted());
    }
}
