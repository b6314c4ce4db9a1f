//! Provider error types and handling

use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur when interacting with chat providers
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Missing or invalid credentials/settings. Surfaced immediately, never retried.
    #[error("{0}")]
    Configuration(String),

    /// Network failure while sending the request or reading the body
    #[error("{0}")]
    Transport(String),

    /// Non-2xx status or in-band vendor error
    #[error("{provider}: {message}")]
    Upstream { provider: String, message: String },

    /// One malformed SSE frame. Recovered inside the decoder.
    #[error("Failed to parse stream frame: {0}")]
    Parse(String),

    /// No provider available, or every attempted provider failed
    #[error("{0}")]
    Exhausted(String),
}

impl ProviderError {
    /// Create an upstream error attributed to a provider
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the gateway may substitute another provider after this error
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Upstream { .. } => true,
            Self::Configuration(_) | Self::Parse(_) | Self::Exhausted(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ProviderError::Transport(format!("Connection failed: {}", err))
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Parse(err.to_string())
    }
}
