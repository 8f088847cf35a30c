//! Error types for API calls
//!
//! Errors are classified by how the UI should react:
//! - Validation: shown inline next to the offending field (400)
//! - Unauthorized: sign-in banner (401)
//! - NotFound: dedicated empty state (404)
//! - Server / Network: generic banner with a retry button
//! - Decode: the server answered with something we could not read
//! - Config: the client itself is misconfigured (bad base URL)

use thiserror::Error;

use crate::analysis::AnalysisError;

/// Error types for calls against the mail API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Not signed in")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid analysis: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Build an error from a non-2xx status and the raw response body.
    ///
    /// Route handlers answer with `{"error": "...", "field": "..."}`; anything
    /// else is kept verbatim as the message.
    pub fn from_status(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<ErrorPayload>(body).ok();
        let message = payload
            .as_ref()
            .map(|p| p.error.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                }
            });

        match status {
            400 | 422 => ApiError::Validation {
                message,
                field: payload.and_then(|p| p.field),
            },
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(message),
            _ => ApiError::Server { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Decode(_) | ApiError::Analysis(_) => ErrorKind::Decode,
            ApiError::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns true if pressing "retry" has a chance of succeeding.
    pub fn can_retry(&self) -> bool {
        matches!(self.kind(), ErrorKind::Server | ErrorKind::Network)
    }

    /// Form field the error belongs to, for inline display.
    pub fn field(&self) -> Option<&str> {
        match self {
            ApiError::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => "Check the highlighted field and try again.",
            ErrorKind::Unauthorized => "Sign in again to continue.",
            ErrorKind::NotFound => "It may have been removed. Refresh the page.",
            ErrorKind::Server => "Something went wrong on our side. Try again.",
            ErrorKind::Network => "Check your internet connection and try again.",
            ErrorKind::Decode => "The server sent an unexpected response. Try again later.",
            ErrorKind::Config => "Check apiBaseUrl in your config file.",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Config(format!("Invalid URL: {}", err))
    }
}

/// JSON error body returned by route handlers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    NotFound,
    Server,
    Network,
    Decode,
    Config,
}

/// Serializable error representation for the UI
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiError {
    pub message: String,
    pub kind: ErrorKind,
    pub can_retry: bool,
    pub recovery_suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&ApiError> for UiError {
    fn from(err: &ApiError) -> Self {
        UiError {
            message: err.to_string(),
            kind: err.kind(),
            can_retry: err.can_retry(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
            field: err.field().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_keeps_field() {
        let err = ApiError::from_status(400, r#"{"error":"Email is required","field":"email"}"#);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("email"));
        assert_eq!(err.to_string(), "Email is required");
        assert!(!err.can_retry());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from_status(401, "").kind(), ErrorKind::Unauthorized);
        assert_eq!(
            ApiError::from_status(404, r#"{"error":"Contact not found"}"#).to_string(),
            "Not found: Contact not found"
        );
        let err = ApiError::from_status(500, r#"{"error":"boom"}"#);
        assert_eq!(err.kind(), ErrorKind::Server);
        assert!(err.can_retry());
    }

    #[test]
    fn test_non_json_body_is_kept_verbatim() {
        let err = ApiError::from_status(502, "Bad Gateway\n");
        assert_eq!(err.to_string(), "Server error 502: Bad Gateway");
        let empty = ApiError::from_status(503, "");
        assert_eq!(empty.to_string(), "Server error 503: HTTP 503");
    }

    #[test]
    fn test_url_parse_error_is_not_retryable() {
        let err = ApiError::from(url::Url::parse("::not-a-url").unwrap_err());
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!err.can_retry());
        assert!(err.to_string().starts_with("Invalid configuration: Invalid URL"));
        assert_eq!(UiError::from(&err).recovery_suggestion, "Check apiBaseUrl in your config file.");
    }

    #[test]
    fn test_ui_error_projection() {
        let err = ApiError::Network("connection refused".to_string());
        let ui = UiError::from(&err);
        assert!(ui.can_retry);
        assert_eq!(ui.kind, ErrorKind::Network);
        let json = serde_json::to_value(&ui).unwrap();
        assert_eq!(json["kind"], "network");
        assert!(json.get("field").is_none());
        assert_eq!(json["recoverySuggestion"], "Check your internet connection and try again.");
    }
}
