use serde_json::{Value, json};

/// Methods every route accepts
pub const METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];

/// The closed set of routes the server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Header,
    All,
    OpenApi,
}

impl Route {
    /// Exact match on the raw request target; no normalization of trailing
    /// slashes or query strings.
    pub fn resolve(path: &str) -> Option<Route> {
        match path {
            "/header" => Some(Route::Header),
            "/all" => Some(Route::All),
            "/openapi" => Some(Route::OpenApi),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        self.spec().path
    }

    pub fn spec(self) -> &'static RouteSpec {
        match self {
            Route::Header => &ROUTES[0],
            Route::All => &ROUTES[1],
            Route::OpenApi => &ROUTES[2],
        }
    }
}

/// One row of the route table, shared by dispatch and the API descriptor
#[derive(Debug)]
pub struct RouteSpec {
    pub route: Route,
    pub path: &'static str,
    pub methods: &'static [&'static str],
    pub summary: &'static str,
    pub success_schema: fn() -> Value,
}

pub static ROUTES: [RouteSpec; 3] = [
    RouteSpec {
        route: Route::Header,
        path: "/header",
        methods: METHODS,
        summary: "Get request headers",
        success_schema: header_schema,
    },
    RouteSpec {
        route: Route::All,
        path: "/all",
        methods: METHODS,
        summary: "Get all request data",
        success_schema: all_schema,
    },
    RouteSpec {
        route: Route::OpenApi,
        path: "/openapi",
        methods: METHODS,
        summary: "Get the API description",
        success_schema: openapi_schema,
    },
];

/// Paths listed in 404 responses, in table order
pub fn available_endpoints() -> impl Iterator<Item = &'static str> {
    ROUTES.iter().map(|spec| spec.path)
}

fn header_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "timestamp": {"type": "string"},
            "request": {
                "type": "object",
                "properties": {
                    "method": {"type": "string"},
                    "headers": {"type": "object"},
                    "client_address": {"type": "string"},
                    "client_port": {"type": "integer"}
                }
            }
        }
    })
}

fn all_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "timestamp": {"type": "string"},
            "request": {
                "type": "object",
                "properties": {
                    "method": {"type": "string"},
                    "path": {"type": "string"},
                    "protocol_version": {"type": "string"},
                    "headers": {"type": "object"},
                    "content_length": {"type": "integer"},
                    "body": {"type": "string", "nullable": true},
                    "client_address": {"type": "string"},
                    "client_port": {"type": "integer"}
                }
            }
        }
    })
}

fn openapi_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "openapi": {"type": "string"},
            "info": {"type": "object"},
            "paths": {"type": "object"}
        }
    })
}
