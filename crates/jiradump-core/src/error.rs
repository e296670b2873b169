//! Error types for jiradump.

use thiserror::Error;

/// Main error type for jiradump operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// The search was rejected as malformed (HTTP 400)
    #[error("Bad request: {}", .messages.join("; "))]
    BadRequest { messages: Vec<String> },

    /// Authentication failed (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Access denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server-side failure (HTTP 5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// API returned any other error status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response or record did not have the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A custom field output name is missing from a mapped issue
    #[error("Custom field '{name}' missing from issue {key}")]
    SpecMismatch { name: String, key: String },

    /// CSV encoding failed
    #[error("CSV error: {0}")]
    Csv(String),

    /// Filesystem operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Classify a non-success HTTP status and its response body.
    ///
    /// A 400 body is parsed for Jira's `errorMessages` and `errors` entries so
    /// they can be reported to the user.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Error::BadRequest {
                messages: jira_error_messages(&body),
            },
            401 => Error::Unauthorized(body),
            403 => Error::Forbidden(body),
            404 => Error::NotFound(body),
            500..=599 => Error::ServerError {
                status,
                message: body,
            },
            _ => Error::Api {
                status,
                message: body,
            },
        }
    }

    /// Whether the error only ends the current project instead of the whole run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::BadRequest { .. })
    }
}

/// Extract messages from a Jira error body:
/// `{"errorMessages": [...], "errors": {"field": "message"}}`.
fn jira_error_messages(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };

    let mut messages: Vec<String> = value
        .get("errorMessages")
        .and_then(|m| m.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if let Some(errors) = value.get("errors").and_then(|e| e.as_object()) {
        for (field, message) in errors {
            if let Some(message) = message.as_str() {
                messages.push(format!("{}: {}", field, message));
            }
        }
    }

    messages
}

/// Result type alias for jiradump operations.
pub type Result<T> = std::result::Result<T, Error>;
