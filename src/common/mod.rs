//! Common traits and helpers used across the httpecho library
//!
//! This module contains the server trait and the helpers integration
//! tests use to spin up a throwaway server.

pub mod test_utils;
pub mod traits;

pub use test_utils::spawn_test_server;
pub use traits::EchoServerTrait;
