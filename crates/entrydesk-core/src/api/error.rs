use std::fmt;

use serde_json::Value;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection failure, timeout, or a request that could not be built
    Transport,
    /// HTTP error status (4xx, 5xx) other than 401
    HttpStatus,
    /// HTTP 401; the cached token has been dropped
    Unauthorized,
    /// A body could not be encoded or decoded
    Parse,
    /// Login failed; the message is meant for the user
    Login,
    /// The session store could not be read or written
    Storage,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Login => write!(f, "login"),
            ApiErrorKind::Storage => write!(f, "storage"),
        }
    }
}

/// Structured error returned by every [`ApiClient`](super::ApiClient) call.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Raw response body, if any
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new error without status or details.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, pulling a cleaner message out of a
    /// JSON body when the server sent one.
    pub fn http_status(status: u16, body: &str) -> Self {
        let kind = if status == 401 {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::HttpStatus
        };
        let message = match body_message(body) {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind,
            status: Some(status),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Classifies a transport-level reqwest failure.
    pub fn transport(e: &reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("Request timed out: {e}")
        } else if e.is_connect() {
            format!("Connection failed: {e}")
        } else if e.is_request() || e.is_builder() {
            format!("Request error: {e}")
        } else {
            format!("Network error: {e}")
        };
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// Creates a login failure carrying the status of the underlying error.
    pub fn login(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            status,
            ..Self::new(ApiErrorKind::Login, message)
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    pub fn storage(e: anyhow::Error) -> Self {
        Self::new(ApiErrorKind::Storage, format!("{e:#}"))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// The `message` field of the server's JSON error body, if present.
    pub fn server_message(&self) -> Option<String> {
        let body = self.details.as_deref()?;
        let json: Value = serde_json::from_str(body).ok()?;
        json.get("message")
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
    }
}

/// Extracts a display message from a JSON error body.
///
/// Accepts both `{"message": "..."}` and `{"error": {"message": "..."}}`.
fn body_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .or_else(|| json.get("error").and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
