//! Error types for the export pipeline.

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that abort an export run.
///
/// Per-object describe failures are deliberately absent: they are logged
/// and the object is skipped without terminating the run. Permission
/// resolution failures, by contrast, are always fatal — the permission
/// maps must be complete or the fail-closed filtering below them is
/// meaningless.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No User record matched the requested username.
    #[error("user not found: {username}")]
    UserNotFound { username: String },

    /// An API call was rejected as unauthorized.
    #[error("authentication failed: {0}; the session may have expired, re-authenticate and retry")]
    Authentication(String),

    /// A query or object-listing call failed.
    #[error("API request failed: {0}")]
    Api(#[source] sfmx_client::Error),

    /// CSV serialization failed.
    #[error("CSV generation failed: {0}")]
    Csv(#[from] csv::Error),

    /// The export options are inconsistent.
    #[error("invalid export options: {0}")]
    InvalidOptions(String),
}

impl From<sfmx_client::Error> for ExportError {
    fn from(err: sfmx_client::Error) -> Self {
        if err.is_auth_error() {
            ExportError::Authentication(err.to_string())
        } else {
            ExportError::Api(err)
        }
    }
}
