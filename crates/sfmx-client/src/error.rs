//! Error types for sfmx-client.

/// Result type alias for sfmx-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfmx-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP request failed.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// Authentication error (HTTP 401).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authorization error (HTTP 403).
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Salesforce API error response.
    #[error("Salesforce API error: {error_code} - {message}")]
    Salesforce { error_code: String, message: String },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Timeout => true,
            ErrorKind::Connection(_) => true,
            ErrorKind::Http { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is typically retryable.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}
