//! HTTP client implementation using reqwest

use crate::config::ConnectionConfig;
use crate::http::error::map_transport_error;
use crate::http::REQUEST_ID_HEADER;
use crate::providers::{ProviderError, ProviderResult};
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Shared HTTP client
///
/// Cloning is cheap; all clones share one underlying `reqwest::Client`.
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> ProviderResult<Self> {
        Self::with_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection settings
    pub fn with_config(config: &ConnectionConfig) -> ProviderResult<Self> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.clone());

        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        let client = builder.build().map_err(|e| {
            ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Send a JSON POST whose response body will be streamed
    ///
    /// Any status is returned as a response; only failures to send or to
    /// receive headers become errors.
    pub async fn post_stream(
        &self,
        provider: &str,
        url: &str,
        headers: HeaderMap,
        body: &Value,
        request_id: Uuid,
    ) -> ProviderResult<Response> {
        info!(
            "Executing streaming request to {} [request_id: {}]",
            provider, request_id
        );
        debug!("Request URL: {}", url);

        let response = self
            .client
            .post(url)
            .headers(headers)
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, provider, request_id))?;

        debug!(
            "Response status: {} [request_id: {}]",
            response.status(),
            request_id
        );
        Ok(response)
    }
}
