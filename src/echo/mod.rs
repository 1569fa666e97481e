//! Request validation and response shaping
//!
//! Every request runs the same decision sequence: media-type check, JSON
//! body validation, then dispatch over the fixed route table. Failures come
//! back as [`RequestError`] and are rendered as structured JSON errors.

pub mod error;
pub mod openapi;
pub mod payload;
pub mod processor;
pub mod routes;

pub use error::RequestError;
pub use openapi::ApiDescriptor;
pub use payload::{EchoResponse, ErrorResponse, RequestSummary};
pub use processor::RequestProcessor;
pub use routes::{ROUTES, Route, RouteSpec};
