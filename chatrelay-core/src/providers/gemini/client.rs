//! Gemini client implementation

use super::converter::{to_gemini_request, GeminiStreamState};
use super::types::GeminiStreamChunk;
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
pub const PROVIDER_NAME: &str = "gemini";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Google Gemini provider
pub struct GeminiProvider {
    config: ChatProviderConfig,
    http: HttpClient,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: ChatProviderConfig, http: HttpClient) -> Self {
        tracing::debug!("Creating gemini provider: {}", config.safe_for_logging());
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

    /// Build request headers. The key goes in a header so it never shows up in logged URLs.
    fn build_headers(&self, api_key: &str) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|_| {
            ProviderError::Configuration("Gemini API key contains invalid characters".into())
        })?;
        headers.insert("x-goog-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
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
            .ok_or_else(|| ProviderError::Configuration("Gemini API key not configured".into()))?;

        let request = to_gemini_request(
            messages,
            system_prompt,
            self.config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        );
        let body = serde_json::to_value(&request)?;
        let headers = self.build_headers(api_key.expose_secret())?;
        let model = self.model().to_string();
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url(),
            model
        );
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

            // No start marker on the wire: emit one as soon as the body is readable
            yield StreamChunk::message_start(Some(model));

            let mut events = decode_events::<GeminiStreamChunk, _, _>(response.bytes_stream(), PROVIDER_NAME);
            let mut state = GeminiStreamState::default();

            while let Some(event) = events.next().await {
                let chunk = match event {
                    Ok(frame) => state.normalize(frame),
                    Err(e) => Some(StreamChunk::error(e.to_string())),
                };
                if let Some(chunk) = chunk {
                    let terminal = chunk.is_error();
                    yield chunk;
                    if terminal {
                        tracing::warn!("gemini stream ended with an error [request_id: {}]", request_id);
                        return;
                    }
                }
            }

            yield state.finish();
            tracing::info!("Request completed successfully for gemini [request_id: {}]", request_id);
        };

        Ok(Box::pin(stream))
    }
}
