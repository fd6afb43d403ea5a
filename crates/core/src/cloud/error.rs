//! Error types for the cloud hand-off.

use thiserror::Error;

/// Errors from pushing an artifact to cloud storage.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The access token's expiry has passed; nothing was sent.
    #[error("Access token has expired")]
    TokenExpired,

    /// The access token is empty.
    #[error("Access token is missing")]
    MissingToken,

    /// The storage API answered with a non-success status.
    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Request timed out.
    #[error("Upload timed out")]
    Timeout,

    /// Could not reach the storage API.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The HTTP client could not be built or the request could not be formed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl CloudError {
    /// Short label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CloudError::Rejected { .. } => "rejected",
            CloudError::TokenExpired | CloudError::MissingToken => "unauthorized",
            _ => "error",
        }
    }
}
