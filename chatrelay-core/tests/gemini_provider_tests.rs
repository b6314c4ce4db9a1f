//! Gemini adapter tests against a mocked streamGenerateContent endpoint

use chatrelay_core::config::ChatProviderConfig;
use chatrelay_core::http::HttpClient;
use chatrelay_core::protocol::types::{ChatMessage, StreamChunk, TokenUsage};
use chatrelay_core::providers::{ChatProvider, GeminiProvider, ProviderError};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_PATH: &str = "/models/gemini-2.0-flash:streamGenerateContent";

fn provider_for(server: &MockServer, config: ChatProviderConfig) -> GeminiProvider {
    let config = ChatProviderConfig {
        base_url: Some(server.uri()),
        ..config
    };
    GeminiProvider::new(config, HttpClient::new().unwrap())
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

fn frame(text: &str, total: u32) -> String {
    format!(
        "data: {}\r\n\r\n",
        json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
            "usageMetadata": {"promptTokenCount": 3, "totalTokenCount": total}
        })
    )
}

#[tokio::test]
async fn test_stream_synthesizes_start_and_stop() {
    let server = MockServer::start().await;
    let body = format!("{}{}", frame("Hel", 7), frame("lo!", 12));
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Hello"}]}],
            "generationConfig": {"maxOutputTokens": 4096}
        })))
        .respond_with(sse(&body))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server, ChatProviderConfig::with_api_key("g-key"));
    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            StreamChunk::message_start(Some("gemini-2.0-flash".into())),
            StreamChunk::content_delta("Hel"),
            StreamChunk::content_delta("lo!"),
            StreamChunk::message_stop(TokenUsage {
                input_tokens: 0,
                output_tokens: 12
            }),
        ]
    );
}

#[tokio::test]
async fn test_assistant_role_and_system_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:streamGenerateContent"))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "Hi"}]},
                {"role": "model", "parts": [{"text": "Hello"}]},
                {"role": "user", "parts": [{"text": "Bye"}]}
            ],
            "systemInstruction": {"parts": [{"text": "Be brief"}]},
            "generationConfig": {"maxOutputTokens": 256}
        })))
        .respond_with(sse(&frame("ok", 1)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(
        &server,
        ChatProviderConfig {
            model: Some("gemini-1.5-pro".into()),
            max_tokens: Some(256),
            ..ChatProviderConfig::with_api_key("g-key")
        },
    );
    let messages = vec![
        ChatMessage::system("dropped"),
        ChatMessage::user("Hi"),
        ChatMessage::assistant("Hello"),
        ChatMessage::user("Bye"),
    ];
    let content = provider.chat(&messages, Some("Be brief")).await.unwrap();
    assert_eq!(content, "ok");
}

#[tokio::test]
async fn test_frames_without_text_are_skipped() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {}\n{}",
        frame("a", 2),
        json!({"candidates": [{"content": {"parts": [{"text": ""}]}, "finishReason": "STOP"}],
               "usageMetadata": {"totalTokenCount": 9}}),
        "data: {broken\n",
    );
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(sse(&body))
        .mount(&server)
        .await;

    let provider = provider_for(&server, ChatProviderConfig::with_api_key("g-key"));
    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[1], StreamChunk::content_delta("a"));
    assert_eq!(
        chunks[2],
        StreamChunk::message_stop(TokenUsage {
            input_tokens: 0,
            output_tokens: 9
        })
    );
}

#[tokio::test]
async fn test_http_error_has_no_start_chunk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server, ChatProviderConfig::with_api_key("g-key"));
    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks, vec![StreamChunk::error("API error: 429")]);
}

#[tokio::test]
async fn test_in_band_error_has_no_stop_chunk() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {}\n{}",
        frame("partial", 4),
        json!({"error": {"code": 500, "message": "Internal error encountered."}}),
        frame("never", 8),
    );
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(sse(&body))
        .mount(&server)
        .await;

    let provider = provider_for(&server, ChatProviderConfig::with_api_key("g-key"));
    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 3);
    assert!(chunks[0].is_message_start());
    assert_eq!(chunks[2], StreamChunk::error("Internal error encountered."));
}

#[tokio::test]
async fn test_missing_key_rejects_stream() {
    let server = MockServer::start().await;
    let provider = provider_for(&server, ChatProviderConfig::default());

    assert!(!provider.is_available());
    let err = provider
        .chat(&[ChatMessage::user("Hello")], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Configuration(ref m) if m == "Gemini API key not configured"));
}

#[tokio::test]
async fn test_empty_body_yields_no_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let provider = provider_for(&server, ChatProviderConfig::with_api_key("g-key"));
    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks, vec![StreamChunk::error("No response body")]);
}

#[tokio::test]
async fn test_connection_failure_yields_error_chunk() {
    let config = ChatProviderConfig {
        base_url: Some("http://127.0.0.1:1".to_string()),
        ..ChatProviderConfig::with_api_key("g-key")
    };
    let provider = GeminiProvider::new(config, HttpClient::new().unwrap());

    let chunks: Vec<StreamChunk> = provider
        .stream_chat(&[ChatMessage::user("Hello")], None)
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_error());
}
