use super::payload::ErrorResponse;
use super::routes::available_endpoints;
use crate::EchoError;
use crate::http::response::{JSON_CONTENT_TYPE, Response};
use http::StatusCode;

/// Ways a single request can fail
///
/// All of them are local to the request: the client gets a structured JSON
/// error and the connection carries on.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<EchoError> for RequestError {
    fn from(err: EchoError) -> Self {
        RequestError::Internal(err.to_string())
    }
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RequestError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing body; parser positions and request details stay in logs
    pub fn body(&self) -> ErrorResponse {
        match self {
            RequestError::UnsupportedMediaType(_) => ErrorResponse::new("Unsupported Media Type")
                .with_supported_types([JSON_CONTENT_TYPE]),
            RequestError::InvalidJson(_) => {
                ErrorResponse::new("Bad Request").with_detail("Invalid JSON payload")
            }
            RequestError::NotFound(_) => {
                ErrorResponse::new("Not Found").with_available_endpoints(available_endpoints())
            }
            RequestError::Internal(detail) => {
                ErrorResponse::new("Internal Server Error").with_detail(detail.clone())
            }
        }
    }

    /// Renders the error as a response
    ///
    /// Falls back to a fixed 500 body in the unlikely case the error body
    /// itself cannot be serialized.
    pub fn into_response(self) -> Response {
        let status = self.status();
        Response::json(status, &self.body()).unwrap_or_else(|_| Response {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: bytes::Bytes::from_static(b"{\n  \"error\": \"Internal Server Error\"\n}"),
            close: false,
        })
    }
}
