//! HTTP client module for issuing streaming requests to chat vendors
//!
//! This module implements the transport layer, handling:
//! - Client construction from connection settings
//! - JSON POST requests whose bodies are consumed as byte streams
//! - Transport error mapping and upstream error extraction
//! - Request ID generation and correlation

pub mod client;
pub mod error;

pub use client::HttpClient;

use uuid::Uuid;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Generate a fresh request id
pub fn new_request_id() -> Uuid {
    Uuid::new_v4()
}
