//! HTTP/1.x transport for the echo server
//!
//! This module frames requests off TCP connections, hands them to the
//! request processor and writes the JSON responses back, honouring
//! keep-alive.

pub mod client;
pub mod codec;
pub mod config;
pub mod request;
pub mod response;
pub mod server;


pub use client::{ClientResponse, HttpEchoClient};
pub use codec::{HttpCodec, HttpError};
pub use config::HttpConfig;
pub use request::{IncomingRequest, RequestHeaders};
pub use response::Response;
pub use server::HttpEchoServer;
