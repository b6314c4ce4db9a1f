//! Google Gemini provider implementation
//!
//! Gemini streams bare content frames with no start or stop markers; the
//! adapter synthesizes both so the output matches every other provider.

mod client;
pub mod converter;
pub mod types;

pub use client::{GeminiProvider, DEFAULT_MODEL, PROVIDER_NAME};
