//! Provider adapter contract
//!
//! Defines the capability every chat provider exposes and the closed set of
//! providers the gateway can route to. Adding a vendor always needs its own
//! event normalizer, so the set is an enum rather than an open plugin list.

use crate::config::ChatProviderConfig;
use crate::http::error::{read_error_body, upstream_error_detail, MAX_ERROR_BODY_BYTES};
use crate::http::HttpClient;
use crate::protocol::types::{ChatMessage, StreamChunk};
use crate::providers::claude::ClaudeProvider;
use crate::providers::gemini::GeminiProvider;
use crate::providers::{ProviderError, ProviderResult};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::Response;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Lazy, single-pass sequence of normalized chunks.
///
/// Dropping the stream releases the underlying connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// Core trait that all chat providers implement
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Stable provider identifier
    fn name(&self) -> &'static str;

    /// Whether a non-empty credential is configured. Never touches the network.
    fn is_available(&self) -> bool;

    /// Start a streaming chat
    ///
    /// Fails immediately with [`ProviderError::Configuration`] when no
    /// credential is configured. Every later failure, including network
    /// errors, arrives as a single terminal error chunk.
    fn stream_chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> ProviderResult<ChunkStream>;

    /// Run a chat to completion and return the concatenated text
    async fn chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> ProviderResult<String> {
        let mut stream = self.stream_chat(messages, system_prompt)?;
        let mut content = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                StreamChunk::ContentDelta { delta } => content.push_str(&delta),
                StreamChunk::Error { error } => {
                    return Err(ProviderError::upstream(self.name(), error));
                }
                StreamChunk::MessageStart { .. } | StreamChunk::MessageStop { .. } => {}
            }
        }

        Ok(content)
    }
}

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderType {
    Claude,
    Gemini,
}

impl ProviderType {
    /// Every provider type, in registration order
    pub fn all() -> [ProviderType; 2] {
        [ProviderType::Gemini, ProviderType::Claude]
    }

    /// Stable identifier used in configuration and responses
    pub fn name(&self) -> &'static str {
        match self {
            ProviderType::Claude => "claude",
            ProviderType::Gemini => "gemini",
        }
    }

    /// Default routing priority (higher = preferred)
    pub fn default_priority(&self) -> u32 {
        match self {
            ProviderType::Gemini => 200,
            ProviderType::Claude => 100,
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderType::Claude => "ANTHROPIC_API_KEY",
            ProviderType::Gemini => "GEMINI_API_KEY",
        }
    }

    /// Environment variable holding the model override
    pub fn model_env(&self) -> &'static str {
        match self {
            ProviderType::Claude => "ANTHROPIC_MODEL",
            ProviderType::Gemini => "GEMINI_MODEL",
        }
    }

    /// Create a provider instance for this type
    pub fn create_provider(&self, config: ChatProviderConfig, http: HttpClient) -> ProviderAdapter {
        match self {
            ProviderType::Claude => ProviderAdapter::Claude(ClaudeProvider::new(config, http)),
            ProviderType::Gemini => ProviderAdapter::Gemini(GeminiProvider::new(config, http)),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "claude-chat" | "anthropic" => Ok(ProviderType::Claude),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            other => Err(format!("Unknown provider '{}'", other)),
        }
    }
}

/// One concrete provider
pub enum ProviderAdapter {
    Claude(ClaudeProvider),
    Gemini(GeminiProvider),
}

impl ProviderAdapter {
    /// Which vendor this adapter talks to
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderAdapter::Claude(_) => ProviderType::Claude,
            ProviderAdapter::Gemini(_) => ProviderType::Gemini,
        }
    }
}

#[async_trait]
impl ChatProvider for ProviderAdapter {
    fn name(&self) -> &'static str {
        match self {
            ProviderAdapter::Claude(p) => p.name(),
            ProviderAdapter::Gemini(p) => p.name(),
        }
    }

    fn is_available(&self) -> bool {
        match self {
            ProviderAdapter::Claude(p) => p.is_available(),
            ProviderAdapter::Gemini(p) => p.is_available(),
        }
    }

    fn stream_chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> ProviderResult<ChunkStream> {
        match self {
            ProviderAdapter::Claude(p) => p.stream_chat(messages, system_prompt),
            ProviderAdapter::Gemini(p) => p.stream_chat(messages, system_prompt),
        }
    }
}

impl fmt::Debug for ProviderAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAdapter")
            .field("name", &self.name())
            .field("available", &self.is_available())
            .finish()
    }
}

/// Send a streaming request and check the response head
///
/// On failure, returns the terminal error chunk the adapter should emit.
pub(crate) async fn open_stream(
    http: &HttpClient,
    provider: &'static str,
    url: &str,
    headers: HeaderMap,
    body: &Value,
    request_id: Uuid,
) -> Result<Response, StreamChunk> {
    let response = http
        .post_stream(provider, url, headers, body, request_id)
        .await
        .map_err(|e| StreamChunk::error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = read_error_body(response.bytes_stream(), MAX_ERROR_BODY_BYTES).await;
        let detail = upstream_error_detail(&body).unwrap_or(body);
        warn!(
            "Request failed with status {} for {} [request_id: {}]: {}",
            status, provider, request_id, detail
        );
        return Err(StreamChunk::error(format!("API error: {}", status.as_u16())));
    }

    if response.content_length() == Some(0) {
        warn!(
            "Empty response body from {} [request_id: {}]",
            provider, request_id
        );
        return Err(StreamChunk::error("No response body"));
    }

    Ok(response)
}
