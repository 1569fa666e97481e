use bytes::Bytes;
use http::{Method, Version};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::net::SocketAddr;

/// Request headers in the order they were first received
///
/// Lookups are case-insensitive. Repeated headers share the entry of their
/// first occurrence, which keeps the case it was first sent with. Every value
/// is kept; [`RequestHeaders::get`] answers with the first one and the JSON
/// form joins them with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header, merging it into an existing entry with the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    fn values(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// Case-insensitive lookup of the first value sent under `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value sent under `name`, joined with `", "`
    pub fn get_joined(&self, name: &str) -> Option<String> {
        self.values(name).map(|values| values.join(", "))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values(name).is_some()
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of header lines received, repeats included
    pub fn line_count(&self) -> usize {
        self.entries.iter().map(|(_, values)| values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names with their joined values, in order of first appearance
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.join(", ")))
    }

    /// True when any value of a comma-separated header contains `token`
    /// (case-insensitive)
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.values(name).is_some_and(|values| {
            values
                .iter()
                .flat_map(|value| value.split(','))
                .any(|item| item.trim().eq_ignore_ascii_case(token))
        })
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = RequestHeaders::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl Serialize for RequestHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, &values.join(", "))?;
        }
        map.end()
    }
}

/// A fully received request, body included
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    /// Raw request target, query string included
    pub path: String,
    pub version: Version,
    pub headers: RequestHeaders,
    /// Exactly the bytes announced by Content-Length
    pub body: Bytes,
    pub client_addr: SocketAddr,
    /// Whether the connection may carry another request after this one
    pub keep_alive: bool,
}

impl IncomingRequest {
    /// Builds a request with defaults suited to tests and benchmarks:
    /// HTTP/1.1, no headers, empty body, keep-alive.
    pub fn new(method: Method, path: impl Into<String>, client_addr: SocketAddr) -> Self {
        Self {
            method,
            path: path.into(),
            version: Version::HTTP_11,
            headers: RequestHeaders::new(),
            body: Bytes::new(),
            client_addr,
            keep_alive: true,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Version the client sent in its request line (`HTTP/1.0`,
    /// `HTTP/1.1`, ...), not the version the server answers with
    pub fn protocol_version(&self) -> &'static str {
        match self.version {
            Version::HTTP_09 => "HTTP/0.9",
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_2 => "HTTP/2.0",
            Version::HTTP_3 => "HTTP/3.0",
            _ => "HTTP/1.1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_headers_are_collapsed_in_first_position() {
        let headers: RequestHeaders = [
            ("Accept", "text/html"),
            ("X-Trace", "a"),
            ("accept", "application/json"),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.line_count(), 3);
        assert_eq!(headers.get("ACCEPT"), Some("text/html"));
        assert_eq!(
            headers.get_joined("accept").as_deref(),
            Some("text/html, application/json")
        );
        assert_eq!(
            serde_json::to_value(&headers).unwrap()["Accept"],
            "text/html, application/json"
        );
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Accept", "X-Trace"]);
    }

    #[test]
    fn test_has_token() {
        let headers: RequestHeaders = [("Connection", "Keep-Alive, Upgrade")].into_iter().collect();
        assert!(headers.has_token("connection", "keep-alive"));
        assert!(headers.has_token("connection", "upgrade"));
        assert!(!headers.has_token("connection", "close"));
        assert!(!headers.has_token("te", "trailers"));
    }

    #[test]
    fn test_headers_serialize_as_object() {
        let headers: RequestHeaders = [("Host", "localhost"), ("X-Custom", "1")].into_iter().collect();
        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json, serde_json::json!({"Host": "localhost", "X-Custom": "1"}));
    }

    #[test]
    fn test_protocol_version() {
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let request = IncomingRequest::new(Method::GET, "/", addr);
        assert_eq!(request.protocol_version(), "HTTP/1.1");
        assert_eq!(request.with_version(Version::HTTP_10).protocol_version(), "HTTP/1.0");
    }
}
