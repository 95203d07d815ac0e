use thiserror::Error;

/// Zephyr client error types
#[derive(Error, Debug)]
pub enum ZephyrError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error {status}. Response: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Protocol(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for Zephyr operations
pub type ZephyrResult<T> = Result<T, ZephyrError>;

impl ZephyrError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an HTTP-level failure from a status code and the raw body
    pub fn request_failed(status: u16, body: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            body: body.into(),
        }
    }

    /// HTTP status carried by a `RequestFailed` error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
