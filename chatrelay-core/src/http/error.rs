//! HTTP error mapping utilities

use crate::providers::ProviderError;
use bytes::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use serde_json::Value;
use tracing::{error, warn};
use uuid::Uuid;

/// Map a failed send into a transport error, logging it with the request id
pub fn map_transport_error(err: reqwest::Error, provider: &str, request_id: Uuid) -> ProviderError {
    if err.is_timeout() {
        warn!("Request timeout for {} [request_id: {}]", provider, request_id);
    } else if err.is_connect() {
        error!(
            "Connection error for {} [request_id: {}]: {}",
            provider, request_id, err
        );
    } else {
        error!(
            "Request error for {} [request_id: {}]: {}",
            provider, request_id, err
        );
    }
    ProviderError::from(err)
}

/// Largest error body read from a non-2xx response
pub const MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

/// Read at most `limit` bytes of an error body as lossy UTF-8
///
/// Reading stops at the limit or the first read error, so an endless or
/// failing error body cannot stall the caller.
pub async fn read_error_body<S, E>(body: S, limit: usize) -> String
where
    S: Stream<Item = Result<Bytes, E>>,
{
    pin_mut!(body);
    let mut buf = Vec::new();
    while buf.len() < limit {
        match body.next().await {
            Some(Ok(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Some(Err(_)) | None => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Extract a human-readable error message from a vendor error body
///
/// Both vendors nest the message under `error.message`; a plain string
/// `error` or top-level `message` is accepted as well.
pub fn upstream_error_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    if let Some(message) = json.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }

    json.get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}
