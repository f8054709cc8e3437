//! Client Module
//!
//! Outbound HTTP and keep-alive probing.

pub mod http;
pub mod keepalive;

pub use http::HttpClient;
pub use keepalive::{KeepAliveProbe, ProbeOutcome};
