use crate::http::codec::HttpError;
use thiserror::Error;

/// Error types for the httpecho library
#[derive(Error, Debug)]
pub enum EchoError {
    /// Socket-level errors (bind, accept, read, write)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 decoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// HTTP framing errors
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<HttpError> for EchoError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Io(e) => EchoError::Io(e),
            other => EchoError::Http(other.to_string()),
        }
    }
}

/// Result type for the httpecho library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod common;
pub mod echo;
pub mod http;
pub mod security;

// Re-export main types for convenience
pub use crate::common::EchoServerTrait;
pub use crate::echo::{ApiDescriptor, RequestError, RequestProcessor};
pub use crate::http::{HttpConfig, HttpEchoClient, HttpEchoServer, IncomingRequest, Response};
