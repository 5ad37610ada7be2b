//! Error types
//!
//! Every fallible call in the crate returns [`Error`]. The variants keep
//! transport failures, application errors reported by the API, task
//! failures and poll timeouts apart so callers can react to each.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP status the API uses for a missing entity
pub const NOT_FOUND: u16 = 404;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// A single structured error carried by an error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// Application error: the server answered, but reported one or more errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API error (HTTP {status_code}): {}", summarize(.errors))]
pub struct ApiErrorResponse {
    pub status_code: u16,
    pub errors: Vec<ApiErrorDetail>,
}

impl ApiErrorResponse {
    pub fn new(status_code: u16, errors: Vec<ApiErrorDetail>) -> Self {
        Self { status_code, errors }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == NOT_FOUND
    }

    /// Error codes in the order the server sent them
    pub fn error_codes(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.error_code.as_str()).collect()
    }
}

fn summarize(errors: &[ApiErrorDetail]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.error_code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error type for the client
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response (DNS, refused, timeout, TLS).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived but its body is not a JSON envelope.
    #[error("Failed to decode response envelope (HTTP {status}): {source}")]
    Envelope {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiErrorResponse),

    /// The task reached a terminal state other than success.
    #[error("Task {task_id} failed with status '{status}'")]
    TaskFailed {
        task_id: String,
        status: String,
        result: Option<Vec<u8>>,
    },

    /// The task was still pending when the attempt budget ran out.
    #[error("Polling of task {task_id} exceeded maximum attempts ({attempts})")]
    PollTimeout { task_id: String, attempts: u32 },

    #[error("Polling of task {task_id} was cancelled")]
    Cancelled { task_id: String },

    /// A payload could not be encoded or parsed into the expected shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of the response behind this error, if one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status_code),
            Error::Envelope { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(api) if api.is_not_found())
    }

    /// The structured error set, for application errors
    pub fn api_errors(&self) -> Option<&[ApiErrorDetail]> {
        match self {
            Error::Api(api) => Some(&api.errors),
            _ => None,
        }
    }
}

/// Format an error for display
/// Security: Maps application errors to generic messages instead of echoing server text
pub fn describe_error(error: &Error) -> String {
    match error {
        Error::Api(api) => match api.status_code {
            401 => "Authentication failed. Check your API key.".to_string(),
            403 => "Permission denied for this service or environment.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. The resource may already exist or be in use.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 | 422 => match api.errors.first() {
                Some(first) if !first.error_code.is_empty() => {
                    format!("Invalid request ({}).", first.error_code)
                },
                _ => "Invalid request. Check your parameters.".to_string(),
            },
            500..=599 => "Service temporarily unavailable. Please try again.".to_string(),
            status => format!("Request failed with HTTP {}.", status),
        },
        Error::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        },
        Error::PollTimeout { task_id, .. } => {
            format!("Task {} is still running. Poll it again later.", task_id)
        },
        other => {
            let text = other.to_string();
            let sanitized = text
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect::<String>();
            if sanitized.len() < text.len() {
                format!("{}...", sanitized)
            } else {
                sanitized
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(code: &str, message: &str) -> ApiErrorDetail {
        ApiErrorDetail {
            error_code: code.to_string(),
            message: message.to_string(),
            context: None,
        }
    }

    #[test]
    fn test_api_error_display_lists_every_error() {
        let err = ApiErrorResponse::new(
            400,
            vec![detail("FOO_ERROR", "message1"), detail("BAR_ERROR", "message2")],
        );
        assert_eq!(
            err.to_string(),
            "API error (HTTP 400): FOO_ERROR: message1; BAR_ERROR: message2"
        );
        assert_eq!(err.error_codes(), vec!["FOO_ERROR", "BAR_ERROR"]);
    }

    #[test]
    fn test_not_found_only_for_404_api_errors() {
        assert!(Error::from(ApiErrorResponse::new(404, vec![])).is_not_found());
        assert!(!Error::from(ApiErrorResponse::new(400, vec![])).is_not_found());
        assert!(!Error::Config("404".to_string()).is_not_found());
    }

    #[test]
    fn test_status_code_exposed_for_application_errors() {
        let err = Error::from(ApiErrorResponse::new(409, vec![detail("CONFLICT", "taken")]));
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(err.api_errors().map(|e| e.len()), Some(1));
        assert_eq!(Error::Cancelled { task_id: "t".into() }.status_code(), None);
    }

    #[test]
    fn test_describe_error_hides_server_messages() {
        let err = Error::from(ApiErrorResponse::new(
            500,
            vec![detail("INTERNAL", "stack trace with secrets")],
        ));
        let msg = describe_error(&err);
        assert!(!msg.contains("secrets"));

        let err = Error::from(ApiErrorResponse::new(400, vec![detail("BAD_NAME", "nope")]));
        assert_eq!(describe_error(&err), "Invalid request (BAD_NAME).");
    }

    #[test]
    fn test_error_detail_uses_wire_names() {
        let detail: ApiErrorDetail =
            serde_json::from_str(r#"{"errorCode":"FOO","message":"bar"}"#).unwrap();
        assert_eq!(detail.error_code, "FOO");
        assert_eq!(detail.message, "bar");
        assert!(detail.context.is_none());
    }
}
