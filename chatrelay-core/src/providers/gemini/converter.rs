//! Conversion between the canonical protocol and Gemini's format

use super::types::{
    GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiStreamChunk,
    GeminiSystemInstruction,
};
use crate::protocol::types::{ChatMessage, MessageRole, StreamChunk, TokenUsage};

/// Build the streaming request body
///
/// System messages are dropped from the turn list and `assistant` turns are
/// renamed to Gemini's `model` role.
pub fn to_gemini_request(
    messages: &[ChatMessage],
    system_prompt: Option<&str>,
    temperature: f32,
    max_tokens: u32,
) -> GeminiRequest {
    GeminiRequest {
        contents: messages
            .iter()
            .filter(|m| !m.is_system())
            .map(|m| GeminiContent {
                role: match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                },
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect(),
        system_instruction: system_prompt.map(|prompt| GeminiSystemInstruction {
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }),
        generation_config: GeminiGenerationConfig {
            temperature,
            max_output_tokens: max_tokens,
        },
    }
}

/// Per-request normalization state
///
/// Gemini has no lifecycle events: the adapter synthesizes the start chunk
/// and asks [`GeminiStreamState::finish`] for the stop chunk at end of body.
#[derive(Debug, Default)]
pub struct GeminiStreamState {
    /// Last cumulative `totalTokenCount` observed
    total_tokens: u32,
}

impl GeminiStreamState {
    /// Map one frame to at most one chunk
    pub fn normalize(&mut self, chunk: GeminiStreamChunk) -> Option<StreamChunk> {
        if let Some(error) = chunk.error {
            let message = match (error.message.is_empty(), error.code) {
                (false, _) => error.message,
                (true, Some(code)) => format!("API error: {}", code),
                (true, None) => "Unknown Gemini error".to_string(),
            };
            return Some(StreamChunk::error(message));
        }

        if let Some(total) = chunk
            .usage_metadata
            .as_ref()
            .and_then(|usage| usage.total_token_count)
        {
            self.total_tokens = total;
            tracing::debug!("gemini total tokens: {}", total);
        }

        match chunk.first_text() {
            Some(text) if !text.is_empty() => Some(StreamChunk::content_delta(text)),
            _ => None,
        }
    }

    /// Stop chunk carrying the last observed token total
    pub fn finish(&self) -> StreamChunk {
        StreamChunk::message_stop(TokenUsage {
            input_tokens: 0,
            output_tokens: self.total_tokens,
        })
    }
}
