//! Claude adapter tests against a mocked Messages API

use chatrelay_core::config::ChatProviderConfig;
use chatrelay_core::http::HttpClient;
use chatrelay_core::protocol::types::{ChatMessage, StreamChunk, TokenUsage};
use chatrelay_core::providers::{ChatProvider, ClaudeProvider, ProviderError};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HAPPY_STREAM: &str = concat!(
    "event: message_start\n",
    "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_01\",\"model\":\"claude-3-5-sonnet-20241022\",\"role\":\"assistant\"}}\n",
    "\n",
    "event: ping\n",
    "data: {\"type\":\"ping\"}\n",
    "\n",
    "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n",
    "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"lo!\"}}\n",
    "data: {\"type\":\"content_block_stop\",\"index\":0}\n",
    "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":5}}\n",
    "data: {\"type\":\"message_stop\"}\n",
);

fn provider_for(server: &MockServer, api_key: Option<&str>) -> ClaudeProvider {
    let config = ChatProviderConfig {
        base_url: Some(server.uri()),
        ..api_key
            .map(ChatProviderConfig::with_api_key)
            .unwrap_or_default()
    };
    ClaudeProvider::new(config, HttpClient::new().unwrap())
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

async fn collect(provider: &ClaudeProvider) -> Vec<StreamChunk> {
    provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await
}

#[tokio::test]
async fn test_stream_normalizes_lifecycle_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(header_exists("X-Request-ID"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 4096,
            "stream": true,
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(sse(HAPPY_STREAM))
        .expect(1)
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;

    assert_eq!(
        chunks,
        vec![
            StreamChunk::message_start(Some("claude-3-5-sonnet-20241022".into())),
            StreamChunk::content_delta("Hel"),
            StreamChunk::content_delta("lo!"),
            StreamChunk::message_stop(TokenUsage {
                input_tokens: 0,
                output_tokens: 5
            }),
        ]
    );
}

#[tokio::test]
async fn test_system_prompt_sent_separately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({
            "system": "Custom system prompt",
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(sse(HAPPY_STREAM))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("test-key"));
    let messages = vec![ChatMessage::system("dropped"), ChatMessage::user("Hello")];
    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&messages, Some("Custom system prompt"))
        .unwrap()
        .collect()
        .await;

    assert!(!chunks.iter().any(StreamChunk::is_error));
}

#[tokio::test]
async fn test_http_error_status_yields_single_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "type": "error",
            "error": {"type": "api_error", "message": "Internal server error"}
        })))
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;
    assert_eq!(chunks, vec![StreamChunk::error("API error: 500")]);
}

#[tokio::test]
async fn test_empty_body_yields_no_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;
    assert_eq!(chunks, vec![StreamChunk::error("No response body")]);
}

#[tokio::test]
async fn test_in_band_error_terminates_stream() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"message_start\",\"message\":{\"model\":\"m\"}}\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}\n",
        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"never\"}}\n",
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1], StreamChunk::content_delta("partial"));
    assert_eq!(chunks[2], StreamChunk::error("Overloaded"));
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"a\"}}\n",
        "data: {not json}\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"b\"}}\n",
        "data: [DONE]\n",
        "data: {\"type\":\"message_stop\"}\n",
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;
    assert_eq!(
        chunks,
        vec![
            StreamChunk::content_delta("a"),
            StreamChunk::content_delta("b"),
            StreamChunk::message_stop(TokenUsage::default()),
        ]
    );
}

#[tokio::test]
async fn test_body_closing_before_message_stop_is_an_error() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"message_start\",\"message\":{\"model\":\"m\"}}\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n",
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;
    assert_eq!(
        chunks,
        vec![
            StreamChunk::message_start(Some("m".into())),
            StreamChunk::content_delta("Hel"),
            StreamChunk::error("Stream ended before message_stop"),
        ]
    );
}

#[tokio::test]
async fn test_chat_rejects_truncated_reply() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"message_start\",\"message\":{\"model\":\"m\"}}\n",
        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n",
    );
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let err = provider_for(&server, Some("test-key"))
        .chat(&[ChatMessage::user("Hello")], None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "claude: Stream ended before message_stop");
}

#[tokio::test]
async fn test_dropping_stream_early_leaves_client_usable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse(HAPPY_STREAM))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("test-key"));

    let mut stream = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap();
    let first = stream.next().await.unwrap();
    assert!(matches!(first, StreamChunk::MessageStart { .. }));
    drop(stream);

    let chunks = collect(&provider).await;
    assert_eq!(chunks.len(), 4);
    assert!(matches!(chunks.last(), Some(StreamChunk::MessageStop { .. })));
}

#[tokio::test]
async fn test_stop_without_usage_reports_zero_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse("data: {\"type\":\"message_stop\"}\n"))
        .mount(&server)
        .await;

    let chunks = collect(&provider_for(&server, Some("test-key"))).await;
    assert_eq!(chunks, vec![StreamChunk::message_stop(TokenUsage::default())]);
}

#[tokio::test]
async fn test_connection_failure_yields_error_chunk() {
    let config = ChatProviderConfig {
        base_url: Some("http://127.0.0.1:1".to_string()),
        ..ChatProviderConfig::with_api_key("test-key")
    };
    let provider = ClaudeProvider::new(config, HttpClient::new().unwrap());

    let chunks = collect(&provider).await;
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_error());
}

#[tokio::test]
async fn test_missing_key_rejects_stream() {
    let server = MockServer::start().await;
    let provider = provider_for(&server, None);

    assert!(!provider.is_available());
    match provider.stream_chat(&[ChatMessage::user("Hello")], None) {
        Err(ProviderError::Configuration(message)) => {
            assert_eq!(message, "Anthropic API key not configured")
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a configuration error"),
    }
}

#[tokio::test]
async fn test_blank_key_is_unavailable() {
    let server = MockServer::start().await;
    assert!(!provider_for(&server, Some("   ")).is_available());
    assert!(provider_for(&server, Some("sk-ant-123")).is_available());
}

#[tokio::test]
async fn test_chat_concatenates_deltas() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(sse(HAPPY_STREAM))
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("test-key"));
    let content = provider
        .chat(&[ChatMessage::user("Hello")], None)
        .await
        .unwrap();
    assert_eq!(content, "Hello!");
}

#[tokio::test]
async fn test_chat_surfaces_error_chunk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = provider_for(&server, Some("test-key"));
    let err = provider
        .chat(&[ChatMessage::user("Hello")], None)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Upstream { ref provider, .. } if provider == "claude"));
    assert_eq!(err.to_string(), "claude: API error: 500");
}
