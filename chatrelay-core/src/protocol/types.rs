//! Core protocol types for chat interactions
//!
//! This module contains the vendor-neutral vocabulary shared by every other
//! component: the messages a caller sends, and the chunk taxonomy every
//! provider stream is normalized into. The design prioritizes:
//! - Invariants enforced by the type (a delta only exists on a delta chunk)
//! - A wire shape that matches what downstream JSON consumers expect
//! - Cheap construction helpers for adapters and tests

use serde::{Deserialize, Serialize};

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions that guide the model's behavior
    System,
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
}

impl MessageRole {
    /// Lowercase wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Text content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a system message
    ///
    /// Providers never send these inline; system instructions travel through
    /// the separate system prompt parameter.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Whether this message is a system message
    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }
}

/// Token accounting reported at the end of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u32,

    /// Generated tokens
    pub output_tokens: u32,
}

/// Metadata attached to lifecycle chunks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Model that produced the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Token usage (message_stop only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// One event of a normalized chat stream
///
/// Every provider grammar collapses into these four variants, so consumers
/// never need to know which vendor produced the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Start of a response
    MessageStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ChunkMetadata>,

        /// Set by the gateway on the first start chunk it forwards
        #[serde(
            default,
            rename = "providerUsed",
            skip_serializing_if = "Option::is_none"
        )]
        provider_used: Option<String>,
    },

    /// Incremental slice of generated text
    ContentDelta { delta: String },

    /// End of a response
    MessageStop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<ChunkMetadata>,
    },

    /// Terminal failure
    Error { error: String },
}

impl StreamChunk {
    /// Start chunk carrying the model name
    pub fn message_start(model: Option<String>) -> Self {
        StreamChunk::MessageStart {
            metadata: Some(ChunkMetadata { model, usage: None }),
            provider_used: None,
        }
    }

    /// Text delta chunk
    pub fn content_delta(delta: impl Into<String>) -> Self {
        StreamChunk::ContentDelta {
            delta: delta.into(),
        }
    }

    /// Stop chunk carrying token usage
    pub fn message_stop(usage: TokenUsage) -> Self {
        StreamChunk::MessageStop {
            metadata: Some(ChunkMetadata {
                model: None,
                usage: Some(usage),
            }),
        }
    }

    /// Error chunk
    pub fn error(message: impl Into<String>) -> Self {
        StreamChunk::Error {
            error: message.into(),
        }
    }

    /// Whether this is an error chunk
    pub fn is_error(&self) -> bool {
        matches!(self, StreamChunk::Error { .. })
    }

    /// Whether this is a start chunk
    pub fn is_message_start(&self) -> bool {
        matches!(self, StreamChunk::MessageStart { .. })
    }

    /// The text delta, if this is a content chunk
    pub fn delta(&self) -> Option<&str> {
        match self {
            StreamChunk::ContentDelta { delta } => Some(delta),
            _ => None,
        }
    }

    /// The error message, if this is an error chunk
    pub fn error_message(&self) -> Option<&str> {
        match self {
            StreamChunk::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Tag a start chunk with the provider that produced it.
    /// Other chunk kinds are returned unchanged.
    pub fn with_provider(self, provider: impl Into<String>) -> Self {
        match self {
            StreamChunk::MessageStart { metadata, .. } => StreamChunk::MessageStart {
                metadata,
                provider_used: Some(provider.into()),
            },
            other => other,
        }
    }
}

/// Result of a non-streaming gateway call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Concatenated response text
    pub content: String,

    /// Name of the provider that produced the content
    pub provider_used: String,

    /// Whether the content came from a provider other than the first one tried
    pub used_fallback: bool,
}
