//! Anthropic Messages API wire types

use serde::{Deserialize, Serialize};

/// Streaming request body for `POST /v1/messages`
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ClaudeMessage>,
    pub stream: bool,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaudeMessage {
    pub role: &'static str,
    pub content: String,
}

/// Stream events, dispatched on their `type` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamEvent {
    MessageStart {
        #[serde(default)]
        message: Option<ClaudeMessageInfo>,
    },
    ContentBlockDelta {
        delta: ClaudeDelta,
    },
    MessageDelta {
        #[serde(default)]
        usage: Option<ClaudeUsage>,
    },
    MessageStop,
    Error {
        error: ClaudeErrorBody,
    },
    /// `ping`, `content_block_start`, `content_block_stop` and anything newer
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessageInfo {
    #[serde(default)]
    pub model: Option<String>,
}

/// Delta payload of a content block
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeDelta {
    TextDelta { text: String },
    /// Tool-input and thinking deltas are not surfaced
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeUsage {
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeErrorBody {
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: String,
}
