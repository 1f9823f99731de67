//! Error types for the media and notification relays

use thiserror::Error;

/// Failures talking to storage or the email relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// The notification relay has no credentials or recipient
    #[error("Notification relay is not configured")]
    NotConfigured,

    /// An upload arrived without any bytes
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// Transport-level failure reaching the relay
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-success status
    #[error("Relay returned {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body as text
        body: String,
    },

    /// Writing an upload to disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;
