//! Chat gateway
//!
//! The two operations callers use: [`ChatGateway::chat`] and
//! [`ChatGateway::stream_chat`]. Both pick a provider through the registry and
//! make exactly one fallback attempt on a provider failure.
//!
//! Streaming fallback replays the whole request against the alternate
//! provider. Content already forwarded from the failed provider stays with the
//! caller and is followed by a fresh sequence starting with a second
//! `message_start`.

use crate::config::GatewayConfig;
use crate::protocol::types::{ChatMessage, ChatResponse, StreamChunk};
use crate::providers::{
    ChatProvider, ChunkStream, ProviderError, ProviderPreference, ProviderRegistry,
    ProviderResult,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{info, warn};

/// Error text when no provider has a credential
pub const NO_PROVIDER_MESSAGE: &str =
    "No AI chat provider available. Configure GEMINI_API_KEY or ANTHROPIC_API_KEY.";

/// Prefix of the error reported when the fallback provider fails too
pub const ALL_FAILED_MESSAGE: &str = "All AI providers failed";

/// Multi-provider chat facade
#[derive(Debug, Clone)]
pub struct ChatGateway {
    registry: Arc<ProviderRegistry>,
    preference: ProviderPreference,
}

impl ChatGateway {
    /// Create a gateway over an existing registry
    pub fn new(registry: ProviderRegistry, preference: ProviderPreference) -> Self {
        Self {
            registry: Arc::new(registry),
            preference,
        }
    }

    /// Build a gateway with every provider from configuration
    pub fn from_config(config: &GatewayConfig) -> ProviderResult<Self> {
        let registry = ProviderRegistry::from_config(config)?;
        Ok(Self::new(registry, config.preferred_provider))
    }

    /// Default provider preference
    pub fn preference(&self) -> ProviderPreference {
        self.preference
    }

    /// All registered provider names in priority order
    pub fn providers(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    /// Names of providers that currently have a credential
    pub fn available_providers(&self) -> Vec<&'static str> {
        self.registry.available_names()
    }

    /// Whether at least one provider can serve requests
    pub fn is_available(&self) -> bool {
        !self.available_providers().is_empty()
    }

    /// Run a chat to completion
    ///
    /// On a transport or upstream failure, one alternate provider is tried. If
    /// none exists the original error is returned unchanged; if it fails too
    /// the error names it.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
        provider_override: Option<ProviderPreference>,
    ) -> ProviderResult<ChatResponse> {
        let preference = provider_override.unwrap_or(self.preference);
        let selection = self
            .registry
            .select(&preference, &[])
            .ok_or_else(|| ProviderError::Exhausted(NO_PROVIDER_MESSAGE.to_string()))?;
        let primary = selection.provider;

        info!("Routing chat to {} (preference: {})", primary.name(), preference);

        let error = match primary.chat(messages, system_prompt).await {
            Ok(content) => {
                return Ok(ChatResponse {
                    content,
                    provider_used: primary.name().to_string(),
                    used_fallback: selection.used_fallback,
                })
            }
            Err(e) if !e.is_fallback_eligible() => return Err(e),
            Err(e) => e,
        };

        let Some(fallback) = self
            .registry
            .select(&ProviderPreference::Auto, &[primary.name()])
        else {
            warn!("{} failed and no fallback is available: {}", primary.name(), error);
            return Err(error);
        };
        let fallback = fallback.provider;

        warn!(
            "{} failed, falling back to {}: {}",
            primary.name(),
            fallback.name(),
            error
        );

        match fallback.chat(messages, system_prompt).await {
            Ok(content) => Ok(ChatResponse {
                content,
                provider_used: fallback.name().to_string(),
                used_fallback: true,
            }),
            Err(fallback_error) => {
                warn!("Fallback provider {} failed: {}", fallback.name(), fallback_error);
                Err(ProviderError::Exhausted(exhausted_message(&fallback_error)))
            }
        }
    }

    /// Stream a chat
    ///
    /// Never fails up front: every failure, including having no provider at
    /// all, arrives as a terminal error chunk. The first `message_start` from
    /// each provider is tagged with that provider's name.
    pub fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        system_prompt: Option<String>,
        provider_override: Option<ProviderPreference>,
    ) -> ChunkStream {
        let registry = Arc::clone(&self.registry);
        let preference = provider_override.unwrap_or(self.preference);

        let stream = async_stream::stream! {
            let primary = match registry.select(&preference, &[]) {
                Some(selection) => selection.provider,
                None => {
                    warn!("{}", NO_PROVIDER_MESSAGE);
                    yield StreamChunk::error(NO_PROVIDER_MESSAGE);
                    return;
                }
            };
            info!("Routing stream to {} (preference: {})", primary.name(), preference);

            let mut failure = None;
            match primary.stream_chat(&messages, system_prompt.as_deref()) {
                Ok(chunks) => {
                    let mut chunks = tag_provider(chunks, primary.name());
                    while let Some(chunk) = chunks.next().await {
                        if chunk.is_error() {
                            failure = Some(chunk);
                            break;
                        }
                        yield chunk;
                    }
                }
                Err(ProviderError::Configuration(message)) => {
                    yield StreamChunk::error(message);
                    return;
                }
                Err(e) => failure = Some(StreamChunk::error(e.to_string())),
            }

            let original = match failure {
                Some(chunk) => chunk,
                None => return,
            };

            let fallback = match registry.select(&ProviderPreference::Auto, &[primary.name()]) {
                Some(selection) => selection.provider,
                None => {
                    warn!(
                        "{} stream failed and no fallback is available: {}",
                        primary.name(),
                        original.error_message().unwrap_or_default()
                    );
                    yield original;
                    return;
                }
            };

            warn!(
                "{} stream failed, replaying on {}: {}",
                primary.name(),
                fallback.name(),
                original.error_message().unwrap_or_default()
            );

            match fallback.stream_chat(&messages, system_prompt.as_deref()) {
                Ok(chunks) => {
                    let mut chunks = tag_provider(chunks, fallback.name());
                    while let Some(chunk) = chunks.next().await {
                        if let Some(message) = chunk.error_message() {
                            let error = ProviderError::upstream(fallback.name(), message);
                            warn!("Fallback provider {} failed: {}", fallback.name(), error);
                            yield StreamChunk::error(exhausted_message(&error));
                            return;
                        }
                        yield chunk;
                    }
                }
                Err(e) => {
                    warn!("Fallback provider {} failed: {}", fallback.name(), e);
                    yield StreamChunk::error(exhausted_message(&e));
                }
            }
        };

        Box::pin(stream)
    }
}

fn exhausted_message(last_error: &ProviderError) -> String {
    format!("{}. {}", ALL_FAILED_MESSAGE, last_error)
}

/// Tag the first `message_start` of a stream with the provider name
fn tag_provider(chunks: ChunkStream, provider: &'static str) -> ChunkStream {
    let mut tagged = false;
    Box::pin(chunks.map(move |chunk| {
        if !tagged && chunk.is_message_start() {
            tagged = true;
            chunk.with_provider(provider)
        } else {
            chunk
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_tag_provider_only_tags_first_start() {
        let chunks: ChunkStream = Box::pin(stream::iter(vec![
            StreamChunk::message_start(Some("m".into())),
            StreamChunk::content_delta("hi"),
            StreamChunk::message_start(None),
        ]));

        let out: Vec<StreamChunk> = tag_provider(chunks, "claude").collect().await;
        assert_eq!(out[0], StreamChunk::message_start(Some("m".into())).with_provider("claude"));
        assert_eq!(out[1], StreamChunk::content_delta("hi"));
        assert_eq!(out[2], StreamChunk::message_start(None));
    }

    #[test]
    fn test_exhausted_message_names_provider() {
        let error = ProviderError::upstream("gemini", "API error: 503");
        assert_eq!(
            exhausted_message(&error),
            "All AI providers failed. gemini: API error: 503"
        );
    }

    #[tokio::test]
    async fn test_empty_gateway() {
        let gateway = ChatGateway::new(ProviderRegistry::new(), ProviderPreference::Auto);
        assert!(!gateway.is_available());

        let err = gateway
            .chat(&[ChatMessage::user("Hi")], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Exhausted(ref m) if m == NO_PROVIDER_MESSAGE));

        let chunks: Vec<StreamChunk> = gateway
            .stream_chat(vec![ChatMessage::user("Hi")], None, None)
            .collect()
            .await;
        assert_eq!(chunks, vec![StreamChunk::error(NO_PROVIDER_MESSAGE)]);
    }
}
