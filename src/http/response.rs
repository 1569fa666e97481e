use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

/// Content type of every response the server writes
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An outgoing response: status code plus a JSON body
///
/// The content type is always `application/json`; `close` asks the
/// transport to end the connection once the response is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Bytes,
    pub close: bool,
}

impl Response {
    /// Serializes `value` as pretty-printed JSON (2-space indent)
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> crate::Result<Self> {
        let body = serde_json::to_vec_pretty(value)?;
        Ok(Self {
            status,
            body: Bytes::from(body),
            close: false,
        })
    }

    pub fn with_close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    pub fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    /// Parses the body back into a JSON value
    pub fn json_body(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
