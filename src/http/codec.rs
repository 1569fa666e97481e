use super::request::{IncomingRequest, RequestHeaders};
use super::response::Response;
use crate::echo::ErrorResponse;
use crate::security::{SizeError, SizeValidator};
use bytes::{Buf, BytesMut};
use http::{Method, StatusCode, Version};
use std::io;
use std::net::SocketAddr;
use tokio_util::codec::{Decoder, Encoder};

/// Largest request head (request line plus headers) buffered before giving up
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed HTTP request: {0}")]
    Malformed(httparse::Error),
    #[error("Too many headers, at most {0} are accepted")]
    TooManyHeaders(usize),
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("Unsupported method ('{0}')")]
    UnsupportedMethod(String),
    #[error(transparent)]
    PayloadTooLarge(#[from] SizeError),
    #[error("Connection closed before the request was complete")]
    Incomplete,
}

impl HttpError {
    /// The response owed to the client for this error, if any
    ///
    /// Socket failures and truncated requests get no response. Every
    /// response returned here closes the connection.
    pub fn response(&self) -> Option<Response> {
        let (status, body) = match self {
            HttpError::Io(_) | HttpError::Incomplete => return None,
            HttpError::Malformed(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Bad Request").with_detail(self.to_string()),
            ),
            HttpError::TooManyHeaders(_) | HttpError::HeadTooLarge(_) => (
                StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
                ErrorResponse::new("Request Header Fields Too Large").with_detail(self.to_string()),
            ),
            HttpError::UnsupportedMethod(_) => (
                StatusCode::NOT_IMPLEMENTED,
                ErrorResponse::new("Not Implemented").with_detail(self.to_string()),
            ),
            HttpError::PayloadTooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorResponse::new("Payload Too Large").with_detail(self.to_string()),
            ),
        };
        Response::json(status, &body)
            .ok()
            .map(|response| response.with_close(true))
    }
}

enum DecodeState {
    Head,
    Body {
        request: IncomingRequest,
        length: usize,
    },
}

/// HTTP/1.x framing for one server-side connection
///
/// Decodes requests whose body is exactly the Content-Length announced in
/// the head, and encodes [`Response`]s as `application/json`.
pub struct HttpCodec {
    peer: SocketAddr,
    max_headers: usize,
    size_validator: SizeValidator,
    server_name: Option<String>,
    state: DecodeState,
}

impl HttpCodec {
    pub fn new(
        peer: SocketAddr,
        max_headers: usize,
        max_body_size: usize,
        server_name: Option<String>,
    ) -> Self {
        Self {
            peer,
            max_headers,
            size_validator: SizeValidator::new(max_body_size),
            server_name,
            state: DecodeState::Head,
        }
    }

    fn decode_head(
        &self,
        src: &mut BytesMut,
    ) -> Result<Option<(IncomingRequest, usize)>, HttpError> {
        let mut headers = vec![httparse::EMPTY_HEADER; self.max_headers];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_len = match req.parse(&src[..]) {
            Ok(httparse::Status::Complete(parsed_len)) => parsed_len,
            Ok(httparse::Status::Partial) => {
                if src.len() > MAX_HEAD_SIZE {
                    return Err(HttpError::HeadTooLarge(MAX_HEAD_SIZE));
                }
                return Ok(None);
            }
            Err(httparse::Error::TooManyHeaders) => {
                return Err(HttpError::TooManyHeaders(self.max_headers));
            }
            Err(e) => return Err(HttpError::Malformed(e)),
        };

        let method = parse_method(req.method.unwrap_or_default())?;
        let path = req.path.unwrap_or("/").to_string();
        let version = match req.version {
            Some(0) => Version::HTTP_10,
            _ => Version::HTTP_11,
        };
        let headers: RequestHeaders = req
            .headers
            .iter()
            .map(|header| (header.name.to_string(), decode_header_value(header.value)))
            .collect();

        src.advance(parsed_len);

        let framing = Framing::from_headers(&headers);
        self.size_validator.validate_size(framing.content_length)?;

        let keep_alive = framing.reliable
            && match version {
                Version::HTTP_10 => headers.has_token("connection", "keep-alive"),
                _ => !headers.has_token("connection", "close"),
            };

        let request = IncomingRequest {
            method,
            path,
            version,
            headers,
            body: bytes::Bytes::new(),
            client_addr: self.peer,
            keep_alive,
        };
        Ok(Some((request, framing.content_length)))
    }
}

impl Decoder for HttpCodec {
    type Item = IncomingRequest;
    type Error = HttpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match std::mem::replace(&mut self.state, DecodeState::Head) {
                DecodeState::Head => match self.decode_head(src)? {
                    Some((request, length)) => {
                        self.state = DecodeState::Body { request, length };
                    }
                    None => return Ok(None),
                },
                DecodeState::Body {
                    mut request,
                    length,
                } => {
                    if src.len() < length {
                        src.reserve(length - src.len());
                        self.state = DecodeState::Body { request, length };
                        return Ok(None);
                    }
                    request.body = src.split_to(length).freeze();
                    return Ok(Some(request));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }
        if src.is_empty() && matches!(self.state, DecodeState::Head) {
            return Ok(None);
        }
        // Drop whatever was partially read
        src.clear();
        self.state = DecodeState::Head;
        Err(HttpError::Incomplete)
    }
}

impl Encoder<Response> for HttpCodec {
    type Error = HttpError;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            response.status.as_u16(),
            response.status.canonical_reason().unwrap_or("")
        );
        if let Some(server_name) = &self.server_name {
            head.push_str(&format!("Server: {server_name}\r\n"));
        }
        head.push_str(&format!(
            "Date: {}\r\n",
            chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT")
        ));
        head.push_str(&format!("Content-Type: {}\r\n", response.content_type()));
        head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
        let connection = if response.close { "close" } else { "keep-alive" };
        head.push_str(&format!("Connection: {connection}\r\n\r\n"));

        dst.reserve(head.len() + response.body.len());
        dst.extend_from_slice(head.as_bytes());
        dst.extend_from_slice(&response.body);
        Ok(())
    }
}

/// How the body of a request is delimited
struct Framing {
    content_length: usize,
    /// False when the end of the body cannot be located with certainty
    reliable: bool,
}

impl Framing {
    fn from_headers(headers: &RequestHeaders) -> Self {
        let (content_length, parsed) = match headers.get("content-length") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(length) => (length, true),
                Err(_) => (0, false),
            },
            None => (0, true),
        };
        Self {
            content_length,
            reliable: parsed && !headers.contains("transfer-encoding"),
        }
    }
}

fn parse_method(name: &str) -> Result<Method, HttpError> {
    match name {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        other => Err(HttpError::UnsupportedMethod(other.to_string())),
    }
}

/// UTF-8 when valid, Latin-1 otherwise
fn decode_header_value(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) => text.to_string(),
        Err(_) => value.iter().map(|&byte| byte as char).collect(),
    }
}
