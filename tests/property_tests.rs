use http::Method;
use httpecho::common::spawn_test_server;
use httpecho::http::{HttpConfig, HttpEchoClient};
use httpecho::{IncomingRequest, RequestProcessor};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use std::net::SocketAddr;

fn client_addr() -> SocketAddr {
    "10.1.2.3:45678".parse().unwrap()
}

fn any_method() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::GET),
        Just(Method::POST),
        Just(Method::PUT),
        Just(Method::DELETE),
    ]
}

/// Custom headers with names unique regardless of case
fn custom_headers() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("X-[A-Za-z]{1,12}", "[A-Za-z0-9_.;=/-]{1,24}"), 0..12).prop_map(
        |headers| {
            let mut seen = HashSet::new();
            headers
                .into_iter()
                .filter(|(name, _)| seen.insert(name.to_ascii_lowercase()))
                .collect()
        },
    )
}

fn json_body() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        any::<i64>().prop_map(|n| n.to_string()),
        "[a-z ]{0,20}".prop_map(|s| Value::String(s).to_string()),
        prop::collection::vec(any::<u16>(), 0..8)
            .prop_map(|items| serde_json::to_string(&items).unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: /header answers 200 and reports the method for every verb
    #[test]
    fn header_route_reports_method(method in any_method(), headers in custom_headers()) {
        let mut request = IncomingRequest::new(method.clone(), "/header", client_addr());
        for (name, value) in &headers {
            request = request.with_header(name.as_str(), value.as_str());
        }

        let response = RequestProcessor::new().process(&request);
        prop_assert_eq!(response.status, 200);

        let body = response.json_body().unwrap();
        prop_assert_eq!(&body["request"]["method"], method.as_str());
        for (name, value) in &headers {
            prop_assert_eq!(&body["request"]["headers"][name.as_str()], value.as_str());
        }
    }

    /// Property: repeated identical requests differ only in the timestamp
    #[test]
    fn responses_are_idempotent_modulo_timestamp(
        method in any_method(),
        path in prop_oneof![Just("/header"), Just("/all")],
        body in json_body(),
    ) {
        let request = IncomingRequest::new(method, path, client_addr())
            .with_header("Content-Type", "application/json")
            .with_body(body);
        let processor = RequestProcessor::new();

        let mut first = processor.process(&request).json_body().unwrap();
        let mut second = processor.process(&request).json_body().unwrap();
        prop_assert!(first["timestamp"].is_string());

        first["timestamp"] = Value::Null;
        second["timestamp"] = Value::Null;
        prop_assert_eq!(first, second);
    }

    /// Property: paths outside the route table are always 404
    #[test]
    fn unknown_paths_are_not_found(method in any_method(), path in "/[a-z]{1,10}") {
        prop_assume!(!["/header", "/all", "/openapi"].contains(&path.as_str()));

        let request = IncomingRequest::new(method, path, client_addr());
        let response = RequestProcessor::new().process(&request);
        prop_assert_eq!(response.status, 404);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: every header sent over the wire comes back unchanged
    #[test]
    fn headers_survive_the_wire(headers in custom_headers()) {
        tokio_test::block_on(async {
            let (server_handle, addr, _shutdown) = spawn_test_server(HttpConfig::default()).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {}", e)))?;

            let mut client = HttpEchoClient::connect(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {}", e)))?;

            let borrowed: Vec<(&str, &str)> = headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            let response = client.request("GET", "/all", &borrowed, b"").await
                .map_err(|e| TestCaseError::fail(format!("Request failed: {}", e)))?;

            server_handle.abort();

            let body = response.json()
                .map_err(|e| TestCaseError::fail(format!("Invalid JSON: {}", e)))?;
            let echoed = &body["request"]["headers"];
            // Host is added by the client
            prop_assert_eq!(echoed.as_object().map(|o| o.len()), Some(headers.len() + 1));
            for (name, value) in &headers {
                prop_assert_eq!(&echoed[name.as_str()], value.as_str());
            }
            Ok(())
        })?;
    }
}
