//! Conversion between the canonical protocol and Anthropic's format

use super::types::{ClaudeDelta, ClaudeMessage, ClaudeRequest, ClaudeStreamEvent};
use crate::protocol::types::{ChatMessage, MessageRole, StreamChunk, TokenUsage};

/// Build the streaming request body
///
/// System messages are dropped from the turn list; the system prompt travels
/// in its own field.
pub fn to_claude_request(
    messages: &[ChatMessage],
    system_prompt: Option<&str>,
    model: &str,
    temperature: f32,
    max_tokens: u32,
) -> ClaudeRequest {
    ClaudeRequest {
        model: model.to_string(),
        max_tokens,
        temperature,
        system: system_prompt.map(str::to_string),
        messages: messages
            .iter()
            .filter(|m| !m.is_system())
            .map(|m| ClaudeMessage {
                role: match m.role {
                    MessageRole::Assistant => "assistant",
                    _ => "user",
                },
                content: m.content.clone(),
            })
            .collect(),
        stream: true,
    }
}

/// Per-request normalization state
#[derive(Debug, Default)]
pub struct ClaudeStreamState {
    /// Last `usage.output_tokens` seen on a `message_delta`
    output_tokens: u32,
}

impl ClaudeStreamState {
    /// Map one vendor event to at most one chunk
    pub fn normalize(&mut self, event: ClaudeStreamEvent) -> Option<StreamChunk> {
        match event {
            ClaudeStreamEvent::MessageStart { message } => Some(StreamChunk::message_start(
                message.and_then(|m| m.model),
            )),
            ClaudeStreamEvent::ContentBlockDelta {
                delta: ClaudeDelta::TextDelta { text },
            } => Some(StreamChunk::content_delta(text)),
            ClaudeStreamEvent::ContentBlockDelta { .. } => None,
            ClaudeStreamEvent::MessageDelta { usage } => {
                if let Some(tokens) = usage.and_then(|u| u.output_tokens) {
                    self.output_tokens = tokens;
                    tracing::debug!("claude output tokens: {}", tokens);
                }
                None
            }
            ClaudeStreamEvent::MessageStop => Some(StreamChunk::message_stop(TokenUsage {
                input_tokens: 0,
                output_tokens: self.output_tokens,
            })),
            ClaudeStreamEvent::Error { error } => {
                let message = match error.error_type {
                    Some(kind) if error.message.is_empty() => kind,
                    _ => error.message,
                };
                Some(StreamChunk::error(message))
            }
            ClaudeStreamEvent::Other => None,
        }
    }
}
