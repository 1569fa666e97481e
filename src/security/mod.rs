//! Resource limits applied by the transport
//!
//! Connection counting and request body size validation.

pub mod limits;

pub use limits::{ConnectionGuard, ConnectionMetrics, ConnectionTracker, SizeError, SizeValidator};
