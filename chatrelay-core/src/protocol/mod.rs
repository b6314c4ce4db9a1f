//! Protocol module for chat request/response structures
//!
//! This module defines the vendor-neutral data model shared by the providers
//! and the gateway.

pub mod types;

pub use types::{ChatMessage, ChatResponse, ChunkMetadata, MessageRole, StreamChunk, TokenUsage};
