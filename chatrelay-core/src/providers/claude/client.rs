//! Claude client implementation

use super::converter::{to_claude_request, ClaudeStreamState};
use super::types::ClaudeStreamEvent;
use crate::config::{ChatProviderConfig, SafeLogging};
use crate::http::{new_request_id, HttpClient};
use crate::protocol::types::{ChatMessage, StreamChunk};
use crate::providers::adapter::{open_stream, ChatProvider, ChunkStream};
use crate::providers::sse::decode_events;
use crate::providers::{ProviderError, ProviderResult};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

/// Stable provider identifier
pub const PROVIDER_NAME: &str = "claude";

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Error reported when the body closes before `message_stop`
pub const STREAM_TRUNCATED_MESSAGE: &str = "Stream ended before message_stop";

/// Anthropic Claude provider
pub struct ClaudeProvider {
    config: ChatProviderConfig,
    http: HttpClient,
}

impl ClaudeProvider {
    /// Create a new Claude provider
    pub fn new(config: ChatProviderConfig, http: HttpClient) -> Self {
        tracing::debug!("Creating claude provider: {}", config.safe_for_logging());
        Self { config, http }
    }

    /// Model requests are sent to
    pub fn model(&self) -> &str {
        self.config.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    /// Build request headers
    fn build_headers(&self, api_key: &str) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|_| {
            ProviderError::Configuration("Anthropic API key contains invalid characters".into())
        })?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ChatProvider for ClaudeProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn is_available(&self) -> bool {
        self.config.has_credentials()
    }

    fn stream_chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> ProviderResult<ChunkStream> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ProviderError::Configuration("Anthropic API key not configured".into()))?;

        let request = to_claude_request(
            messages,
            system_prompt,
            self.model(),
            self.config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        );
        let body = serde_json::to_value(&request)?;
        let headers = self.build_headers(api_key.expose_secret())?;
        let url = format!("{}/messages", self.base_url());
        let http = self.http.clone();

        let stream = async_stream::stream! {
            let request_id = new_request_id();
            let response = match open_stream(&http, PROVIDER_NAME, &url, headers, &body, request_id).await {
                Ok(response) => response,
                Err(chunk) => {
                    yield chunk;
                    return;
                }
            };

            let mut events = decode_events::<ClaudeStreamEvent, _, _>(response.bytes_stream(), PROVIDER_NAME);
            let mut state = ClaudeStreamState::default();
            let mut saw_stop = false;

            while let Some(event) = events.next().await {
                let chunk = match event {
                    Ok(event) => state.normalize(event),
                    Err(e) => Some(StreamChunk::error(e.to_string())),
                };
                if let Some(chunk) = chunk {
                    saw_stop |= matches!(chunk, StreamChunk::MessageStop { .. });
                    let terminal = chunk.is_error();
                    yield chunk;
                    if terminal {
                        tracing::warn!("claude stream ended with an error [request_id: {}]", request_id);
                        return;
                    }
                }
            }

            // A body that closes without message_stop is a truncated reply
            if !saw_stop {
                tracing::warn!("claude stream closed before message_stop [request_id: {}]", request_id);
                yield StreamChunk::error(STREAM_TRUNCATED_MESSAGE);
                return;
            }

            tracing::info!("Request completed successfully for claude [request_id: {}]", request_id);
        };

        Ok(Box::pin(stream))
    }
}
