//! Server-Sent Events decoding shared by every provider
//!
//! Vendors stream newline-delimited `data: {json}` frames. Decoding is split
//! in two layers:
//! - [`SseLineDecoder`] is a synchronous, allocation-light state machine that
//!   turns arbitrary byte fragments into complete `data:` payloads.
//! - [`decode_events`] drives it over a response body and parses each payload
//!   into the vendor's typed event, skipping frames that fail to parse.

use crate::providers::ProviderError;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::Pin;

/// Prefix of every payload line we care about
const DATA_PREFIX: &str = "data: ";

/// Sentinel some vendors send as the final frame
const DONE_SENTINEL: &str = "[DONE]";

/// Decoded event stream. A transport failure is yielded once, then the stream ends.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = Result<T, ProviderError>> + Send>>;

/// Incremental line splitter for SSE bodies
///
/// Holds incomplete UTF-8 sequences and the trailing partial line across
/// calls to [`SseLineDecoder::feed`]. A fresh decoder is created per request.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    /// Bytes of a multi-byte character split across reads
    pending_bytes: Vec<u8>,
    /// Text after the last newline seen so far
    buffer: String,
}

impl SseLineDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read's worth of bytes and return the payloads of every line
    /// completed by it, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        if bytes.is_empty() {
            return Vec::new();
        }

        let text = self.decode_utf8(bytes);
        self.buffer.push_str(&text);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(payload) = Self::extract_payload(&line) {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }

    /// Text still waiting for a newline. Discarded when the stream ends.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }

    /// Decode as much of the pending bytes as forms complete characters.
    /// Invalid sequences are replaced rather than aborting the stream.
    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        self.pending_bytes.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending_bytes.len());
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(valid) => {
                    out.push_str(valid);
                    self.pending_bytes.clear();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending_bytes[..valid_up_to]));
                    match e.error_len() {
                        // Truncated character at the end: wait for the next read
                        None => {
                            self.pending_bytes.drain(..valid_up_to);
                            break;
                        }
                        Some(invalid_len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid_up_to + invalid_len);
                        }
                    }
                }
            }
        }
        out
    }

    /// Payload of a `data:` line, or `None` for blank lines, other fields,
    /// and the done sentinel.
    fn extract_payload(line: &str) -> Option<&str> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let payload = line.strip_prefix(DATA_PREFIX)?;
        if payload == DONE_SENTINEL {
            return None;
        }
        Some(payload)
    }
}

/// Parse a response body into typed SSE events
///
/// Malformed frames are logged and skipped; one bad frame never ends the
/// stream. The underlying body is dropped, and its connection released,
/// whenever the returned stream is dropped.
pub fn decode_events<T, S, E>(body: S, provider: &'static str) -> EventStream<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ProviderError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut body = Box::pin(body);
        let mut decoder = SseLineDecoder::new();

        while let Some(read) = body.next().await {
            let bytes = match read {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err: ProviderError = e.into();
                    tracing::error!("Stream read failed for {}: {}", provider, err);
                    yield Err(err);
                    return;
                }
            };

            for payload in decoder.feed(&bytes) {
                match serde_json::from_str::<T>(&payload) {
                    Ok(event) => {
                        yield Ok(event);
                    }
                    Err(e) => {
                        // Log parsing error but continue stream
                        tracing::warn!("Skipping malformed frame from {}: {}", provider, e);
                    }
                }
            }
        }

        if !decoder.remainder().trim().is_empty() {
            tracing::debug!(
                "Discarding {} unterminated bytes from {}",
                decoder.remainder().len(),
                provider
            );
        }
    };

    Box::pin(stream)
}
