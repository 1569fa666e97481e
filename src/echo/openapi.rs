use super::routes::{ROUTES, RouteSpec};
use serde_json::{Map, Value, json};
use std::sync::LazyLock;

static DESCRIPTOR: LazyLock<ApiDescriptor> = LazyLock::new(|| ApiDescriptor::build(&ROUTES));

/// Static description of the API surface in OpenAPI 3.0 form
///
/// Built once from the route table and read-only afterwards, so it can be
/// shared by every connection without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDescriptor {
    document: Value,
}

impl ApiDescriptor {
    /// The process-wide descriptor
    pub fn global() -> &'static ApiDescriptor {
        &DESCRIPTOR
    }

    pub fn build(routes: &[RouteSpec]) -> Self {
        let mut paths = Map::new();
        for route in routes {
            let mut operations = Map::new();
            for method in route.methods {
                operations.insert(method.to_lowercase(), operation(route));
            }
            paths.insert(route.path.to_string(), Value::Object(operations));
        }

        let document = json!({
            "openapi": "3.0.0",
            "info": {
                "title": "Echo Server API",
                "version": "1.0.0",
                "description": "A simple echo server that returns headers and request data"
            },
            "paths": paths
        });
        Self { document }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

fn operation(route: &RouteSpec) -> Value {
    let schema = (route.success_schema)();
    json!({
        "summary": route.summary,
        "responses": {
            "200": {
                "description": "Successful response",
                "content": {"application/json": {"schema": schema}}
            },
            "400": {
                "description": "Bad Request",
                "content": {"application/json": {"schema": {
                    "type": "object",
                    "properties": {
                        "error": {"type": "string"},
                        "detail": {"type": "string"}
                    }
                }}}
            },
            "415": {
                "description": "Unsupported Media Type",
                "content": {"application/json": {"schema": {
                    "type": "object",
                    "properties": {
                        "error": {"type": "string"},
                        "supported_types": {"type": "array", "items": {"type": "string"}}
                    }
                }}}
            }
        }
    })
}
