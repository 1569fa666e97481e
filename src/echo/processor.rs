use super::error::RequestError;
use super::openapi::ApiDescriptor;
use super::payload::{EchoResponse, RequestSummary};
use super::routes::Route;
use crate::http::request::IncomingRequest;
use crate::http::response::{JSON_CONTENT_TYPE, Response};
use chrono::{DateTime, Local};
use http::{Method, StatusCode};
use serde::de::IgnoredAny;
use tracing::{debug, info};

/// Source of the timestamps stamped on echo payloads
pub type Clock = fn() -> DateTime<Local>;

/// Turns one [`IncomingRequest`] into exactly one [`Response`]
///
/// The processor is stateless apart from the shared, read-only
/// [`ApiDescriptor`], so a single copy can serve every connection.
///
/// # Examples
///
/// ```
/// use httpecho::{IncomingRequest, RequestProcessor};
/// use http::Method;
///
/// let processor = RequestProcessor::new();
/// let request = IncomingRequest::new(Method::GET, "/header", "127.0.0.1:5000".parse().unwrap());
/// let response = processor.process(&request);
/// assert_eq!(response.status, 200);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequestProcessor {
    descriptor: &'static ApiDescriptor,
    clock: Clock,
}

impl Default for RequestProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestProcessor {
    pub fn new() -> Self {
        Self {
            descriptor: ApiDescriptor::global(),
            clock: Local::now,
        }
    }

    /// Replaces the wall clock, mostly useful to pin timestamps in tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn descriptor(&self) -> &'static ApiDescriptor {
        self.descriptor
    }

    /// Runs the full decision sequence and renders the outcome
    ///
    /// Successful requests are traced; failures are rendered as JSON error
    /// responses with the matching status code.
    pub fn process(&self, request: &IncomingRequest) -> Response {
        let timestamp = self.timestamp();
        match self.try_process(request, &timestamp) {
            Ok(response) => {
                trace_request(request, &timestamp);
                response
            }
            Err(err) => {
                debug!(method = %request.method, path = %request.path, error = %err, "Request rejected");
                err.into_response()
            }
        }
    }

    /// The decision sequence; first failing check wins
    pub fn try_process(
        &self,
        request: &IncomingRequest,
        timestamp: &str,
    ) -> Result<Response, RequestError> {
        check_media_type(request)?;
        validate_json_body(request)?;

        match Route::resolve(&request.path) {
            Some(Route::OpenApi) => Ok(Response::json(StatusCode::OK, self.descriptor.document())?),
            Some(Route::Header) => {
                let payload = EchoResponse {
                    timestamp: timestamp.to_string(),
                    request: RequestSummary::Headers {
                        method: request.method.as_str(),
                        headers: &request.headers,
                        client_address: request.client_addr.ip().to_string(),
                        client_port: request.client_addr.port(),
                    },
                };
                Ok(Response::json(StatusCode::OK, &payload)?)
            }
            Some(Route::All) => {
                let body = if request.body.is_empty() {
                    None
                } else {
                    Some(std::str::from_utf8(&request.body).map_err(crate::EchoError::from)?)
                };
                let payload = EchoResponse {
                    timestamp: timestamp.to_string(),
                    request: RequestSummary::Full {
                        method: request.method.as_str(),
                        path: &request.path,
                        protocol_version: request.protocol_version(),
                        headers: &request.headers,
                        content_length: request.body.len(),
                        body,
                        client_address: request.client_addr.ip().to_string(),
                        client_port: request.client_addr.port(),
                    },
                };
                Ok(Response::json(StatusCode::OK, &payload)?)
            }
            None => Err(RequestError::NotFound(request.path.clone())),
        }
    }

    fn timestamp(&self) -> String {
        (self.clock)().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn carries_payload(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT)
}

/// POST and PUT must declare JSON when they declare anything at all.
/// Only the first Content-Type line counts.
fn check_media_type(request: &IncomingRequest) -> Result<(), RequestError> {
    if !carries_payload(&request.method) {
        return Ok(());
    }
    match request.headers.get("content-type") {
        Some(content_type)
            if !content_type.is_empty()
                && !content_type.to_ascii_lowercase().contains(JSON_CONTENT_TYPE) =>
        {
            Err(RequestError::UnsupportedMediaType(content_type.to_string()))
        }
        _ => Ok(()),
    }
}

/// Parses a POST/PUT body as JSON and throws the value away
fn validate_json_body(request: &IncomingRequest) -> Result<(), RequestError> {
    if !carries_payload(&request.method) || request.body.is_empty() {
        return Ok(());
    }
    serde_json::from_slice::<IgnoredAny>(&request.body).map_err(RequestError::InvalidJson)?;
    Ok(())
}

fn trace_request(request: &IncomingRequest, timestamp: &str) {
    info!(
        method = %request.method,
        timestamp,
        path = %request.path,
        headers = request.headers.line_count(),
        payload_bytes = request.body.len(),
        client = %request.client_addr,
        "Echoed request"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};
    use std::io::Write;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    fn fixed_clock() -> DateTime<Local> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap()
            .with_timezone(&Local)
    }

    fn processor() -> RequestProcessor {
        RequestProcessor::new().with_clock(fixed_clock)
    }

    fn client() -> SocketAddr {
        "192.0.2.7:40123".parse().unwrap()
    }

    fn run(request: IncomingRequest) -> (StatusCode, Value) {
        let response = processor().process(&request);
        let body = response.json_body().unwrap();
        (response.status, body)
    }

    #[test]
    fn test_header_route_for_every_method() {
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            let request = IncomingRequest::new(method.clone(), "/header", client())
                .with_header("X-Custom", "yes");
            let (status, body) = run(request);
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["request"]["method"], method.as_str());
            assert_eq!(body["request"]["headers"]["X-Custom"], "yes");
            assert_eq!(body["request"]["client_address"], "192.0.2.7");
            assert_eq!(body["request"]["client_port"], 40123);
        }
    }

    #[test]
    fn test_non_json_content_type_is_rejected() {
        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "text/plain")
            .with_body("hello");
        let (status, body) = run(request);
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            body,
            json!({"error": "Unsupported Media Type", "supported_types": ["application/json"]})
        );
    }

    #[test]
    fn test_content_type_check_is_case_insensitive_and_substring() {
        let request = IncomingRequest::new(Method::PUT, "/all", client())
            .with_header("content-type", "Application/JSON; charset=utf-8")
            .with_body("[]");
        let (status, _) = run(request);
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_missing_or_empty_content_type_is_accepted() {
        let request = IncomingRequest::new(Method::POST, "/all", client()).with_body("{}");
        assert_eq!(run(request).0, StatusCode::OK);

        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "")
            .with_body("{}");
        assert_eq!(run(request).0, StatusCode::OK);
    }

    #[test]
    fn test_get_and_delete_skip_validation() {
        for method in [Method::GET, Method::DELETE] {
            let request = IncomingRequest::new(method, "/all", client())
                .with_header("Content-Type", "text/plain")
                .with_body("not json");
            let (status, body) = run(request);
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["request"]["body"], "not json");
        }
    }

    #[test]
    fn test_all_echoes_json_body() {
        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"a":1}"#);
        let (status, body) = run(request);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["request"]["body"], r#"{"a":1}"#);
        assert_eq!(body["request"]["content_length"], 7);
        assert_eq!(body["request"]["protocol_version"], "HTTP/1.1");
        assert_eq!(body["request"]["path"], "/all");
    }

    #[test]
    fn test_all_with_empty_body_reports_null() {
        let (status, body) = run(IncomingRequest::new(Method::GET, "/all", client()));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["request"]["body"], Value::Null);
        assert_eq!(body["request"]["content_length"], 0);
    }

    #[test]
    fn test_invalid_json_is_bad_request() {
        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "application/json")
            .with_body("not json");
        let (status, body) = run(request);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Bad Request", "detail": "Invalid JSON payload"}));
    }

    #[test]
    fn test_openapi_still_validates_body() {
        let request = IncomingRequest::new(Method::PUT, "/openapi", client()).with_body("{");
        assert_eq!(run(request).0, StatusCode::BAD_REQUEST);

        let (status, body) = run(IncomingRequest::new(Method::GET, "/openapi", client()));
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/header"]["delete"].is_object());
    }

    #[test]
    fn test_media_type_is_checked_before_json() {
        let request = IncomingRequest::new(Method::POST, "/unknown", client())
            .with_header("Content-Type", "text/xml")
            .with_body("<x/>");
        assert_eq!(run(request).0, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let (status, body) = run(IncomingRequest::new(Method::GET, "/unknown", client()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"error": "Not Found", "available_endpoints": ["/header", "/all", "/openapi"]})
        );
    }

    #[test]
    fn test_query_string_is_not_stripped_for_matching() {
        let (status, _) = run(IncomingRequest::new(Method::GET, "/all?x=1", client()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_utf8_body_is_internal_error() {
        let request = IncomingRequest::new(Method::GET, "/all", client())
            .with_body(vec![0x66, 0x6f, 0xff]);
        let (status, body) = run(request);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["detail"].as_str().unwrap().contains("invalid utf-8"));
    }

    #[test]
    fn test_pinned_clock_makes_responses_identical() {
        let request = IncomingRequest::new(Method::GET, "/all", client()).with_header("A", "b");
        let first = processor().process(&request);
        let second = processor().process(&request);
        assert_eq!(first, second);

        let body = first.json_body().unwrap();
        let expected = fixed_clock().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        assert_eq!(body["timestamp"], expected);
    }

    #[test]
    fn test_first_content_type_decides() {
        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "text/plain")
            .with_header("Content-Type", "application/json")
            .with_body("{}");
        let (status, body) = run(request);
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["supported_types"], json!(["application/json"]));

        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "application/json")
            .with_header("Content-Type", "text/plain")
            .with_body("{}");
        let (status, body) = run(request);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["request"]["headers"]["Content-Type"],
            "application/json, text/plain"
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| line.contains("Echoed request"))
                .map(str::to_string)
                .collect()
        }
    }

    fn traced(request: &IncomingRequest) -> (StatusCode, Vec<String>) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let response =
            tracing::subscriber::with_default(subscriber, || processor().process(request));
        (response.status, logs.lines())
    }

    #[test]
    fn test_success_is_traced_once() {
        let request = IncomingRequest::new(Method::POST, "/all", client())
            .with_header("Content-Type", "application/json")
            .with_header("X-Dup", "1")
            .with_header("X-Dup", "2")
            .with_body(r#"{"a":1}"#);
        let (status, lines) = traced(&request);

        assert_eq!(status, StatusCode::OK);
        assert_eq!(lines.len(), 1, "{lines:?}");
        let line = &lines[0];
        assert!(line.contains("method=POST"), "{line}");
        assert!(line.contains("path=/all"), "{line}");
        assert!(line.contains("headers=3"), "{line}");
        assert!(line.contains("payload_bytes=7"), "{line}");
        assert!(line.contains("client=192.0.2.7:40123"), "{line}");
    }

    #[test]
    fn test_failures_are_not_traced() {
        let not_found = IncomingRequest::new(Method::GET, "/unknown", client());
        let (status, lines) = traced(&not_found);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(lines.is_empty(), "{lines:?}");

        let unsupported = IncomingRequest::new(Method::PUT, "/all", client())
            .with_header("Content-Type", "text/plain")
            .with_body("x");
        let (status, lines) = traced(&unsupported);
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(lines.is_empty(), "{lines:?}");
    }
}
