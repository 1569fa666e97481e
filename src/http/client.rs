use crate::{EchoError, Result};
use bytes::{Buf, Bytes, BytesMut};
use http::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// A response as read off the wire by [`HttpEchoClient`]
#[derive(Debug, Clone)]
pub struct ClientResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ClientResponse {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Minimal HTTP/1.1 client for talking to the echo server
///
/// Keeps one connection open so several requests can go over it.
///
/// # Examples
///
/// ```no_run
/// use httpecho::http::HttpEchoClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = "127.0.0.1:8000".parse()?;
///     let mut client = HttpEchoClient::connect(addr).await?;
///
///     let response = client
///         .request("POST", "/all", &[("Content-Type", "application/json")], br#"{"a":1}"#)
///         .await?;
///     println!("{}", response.json()?["request"]["body"]);
///     Ok(())
/// }
/// ```
pub struct HttpEchoClient {
    stream: TcpStream,
    buffer: BytesMut,
    read_timeout: Duration,
}

impl HttpEchoClient {
    /// Connects to an HTTP echo server at the given address
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| EchoError::Config(format!("Failed to connect to {addr}: {e}")))?;
        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(8192),
            read_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Sends a request with `Host` and, for non-empty bodies, `Content-Length`
    /// added to the given headers
    pub async fn request(
        &mut self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<ClientResponse> {
        let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n");
        for (name, value) in headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        if !body.is_empty() {
            raw.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        raw.push_str("\r\n");

        let mut bytes = raw.into_bytes();
        bytes.extend_from_slice(body);
        self.send_raw(&bytes).await
    }

    /// Writes `raw` untouched and reads back one response
    pub async fn send_raw(&mut self, raw: &[u8]) -> Result<ClientResponse> {
        self.stream.write_all(raw).await?;
        self.stream.flush().await?;
        self.read_response().await
    }

    /// Reads one complete response, framed by its Content-Length
    pub async fn read_response(&mut self) -> Result<ClientResponse> {
        loop {
            if let Some(response) = self.parse_buffered()? {
                return Ok(response);
            }
            let n = timeout(self.read_timeout, self.stream.read_buf(&mut self.buffer))
                .await
                .map_err(|_| EchoError::Timeout("waiting for response".to_string()))??;
            if n == 0 {
                return Err(EchoError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed before a complete response",
                )));
            }
        }
    }

    /// Whether the server has closed its side of the connection
    pub async fn is_closed(&mut self) -> bool {
        let mut probe = [0u8; 1];
        matches!(
            timeout(self.read_timeout, self.stream.read(&mut probe)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }

    fn parse_buffered(&mut self) -> Result<Option<ClientResponse>> {
        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut res = httparse::Response::new(&mut headers);

        let head_len = match res.parse(&self.buffer[..]) {
            Ok(httparse::Status::Complete(head_len)) => head_len,
            Ok(httparse::Status::Partial) => return Ok(None),
            Err(e) => return Err(EchoError::Http(format!("Failed to parse response: {e}"))),
        };

        let status = StatusCode::from_u16(res.code.unwrap_or_default())
            .map_err(|e| EchoError::Http(format!("Invalid status code: {e}")))?;
        let headers: Vec<(String, String)> = res
            .headers
            .iter()
            .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
            .collect();

        let content_length = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        if self.buffer.len() < head_len + content_length {
            return Ok(None);
        }

        self.buffer.advance(head_len);
        let body = self.buffer.split_to(content_length).freeze();
        Ok(Some(ClientResponse {
            status,
            headers,
            body,
        }))
    }
}
