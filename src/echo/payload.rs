use crate::http::request::RequestHeaders;
use serde::{Deserialize, Serialize};

/// Body of every error response
///
/// `error` is always present; the other fields only appear for the errors
/// that carry them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_types: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
            available_endpoints: None,
            supported_types: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_available_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_endpoints = Some(endpoints.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_supported_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_types = Some(types.into_iter().map(Into::into).collect());
        self
    }
}

/// Successful echo payload: a timestamp and a summary of the request
#[derive(Debug, Serialize)]
pub struct EchoResponse<'a> {
    pub timestamp: String,
    pub request: RequestSummary<'a>,
}

/// Request summary; its shape depends on the route that was hit
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestSummary<'a> {
    /// `/header`
    Headers {
        method: &'a str,
        headers: &'a RequestHeaders,
        client_address: String,
        client_port: u16,
    },
    /// `/all`
    Full {
        method: &'a str,
        path: &'a str,
        protocol_version: &'a str,
        headers: &'a RequestHeaders,
        content_length: usize,
        body: Option<&'a str>,
        client_address: String,
        client_port: u16,
    },
}
