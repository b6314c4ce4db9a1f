//! Anthropic Claude provider implementation
//!
//! Claude's stream carries explicit lifecycle markers (`message_start`,
//! `message_stop`), so normalization is a direct event-by-event mapping.

mod client;
pub mod converter;
pub mod types;

pub use client::{ClaudeProvider, DEFAULT_MODEL, PROVIDER_NAME};
