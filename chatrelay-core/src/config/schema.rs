//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::{SafeLogging, SecretString};
use crate::providers::{ProviderPreference, ProviderType};
use serde::{Deserialize, Serialize};

/// The only schema version currently understood
pub const SUPPORTED_VERSION: &str = "0.1";

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Which provider to try first: a provider name or `auto`
    #[serde(default)]
    pub preferred_provider: ProviderPreference,

    /// Per-vendor settings
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Outbound connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            preferred_provider: ProviderPreference::Auto,
            providers: ProvidersConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }
}

/// Settings for each supported vendor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub claude: ChatProviderConfig,

    #[serde(default)]
    pub gemini: ChatProviderConfig,
}

impl ProvidersConfig {
    /// Settings for one provider
    pub fn get(&self, provider_type: ProviderType) -> &ChatProviderConfig {
        match provider_type {
            ProviderType::Claude => &self.claude,
            ProviderType::Gemini => &self.gemini,
        }
    }
}

/// Construction-time settings of one provider adapter
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatProviderConfig {
    /// API key; absent or blank means the provider is unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Model identifier; the provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Override of the vendor API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Routing priority (higher = preferred)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl ChatProviderConfig {
    /// Config holding only a credential
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(api_key)),
            ..Default::default()
        }
    }

    /// Whether a non-empty credential is configured
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.is_empty())
    }

    /// Validate provider settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.model.as_ref().is_some_and(|model| model.trim().is_empty()) {
            return Err(ValidationError::new(
                format!("{}.model", path),
                ValidationErrorKind::BlankModel,
            ));
        }

        if let Some(value) = self.temperature {
            if !(0.0..=2.0).contains(&value) {
                return Err(ValidationError::new(
                    format!("{}.temperature", path),
                    ValidationErrorKind::TemperatureOutOfRange { value },
                ));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(ValidationError::new(
                format!("{}.max_tokens", path),
                ValidationErrorKind::Zero,
            ));
        }

        if let Some(base_url) = &self.base_url {
            let field = format!("{}.base_url", path);
            let url = url::Url::parse(base_url).map_err(|e| {
                ValidationError::new(
                    field.clone(),
                    ValidationErrorKind::InvalidUrl {
                        message: e.to_string(),
                    },
                )
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ValidationError::new(
                    field,
                    ValidationErrorKind::UnsupportedScheme {
                        scheme: url.scheme().to_string(),
                    },
                ));
            }
        }

        Ok(())
    }
}

impl SafeLogging for ChatProviderConfig {
    fn safe_for_logging(&self) -> String {
        format!(
            "api_key={}, model={}, temperature={}, max_tokens={}",
            self.api_key
                .as_ref()
                .map(SecretString::partial_redact)
                .unwrap_or_else(|| "[NONE]".to_string()),
            self.model.as_deref().unwrap_or("<default>"),
            self.temperature
                .map(|t| t.to_string())
                .unwrap_or_else(|| "<default>".to_string()),
            self.max_tokens
                .map(|t| t.to_string())
                .unwrap_or_else(|| "<default>".to_string()),
        )
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds. Unset by default: a stalled
    /// stream blocks until the transport gives up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: None,
            user_agent: default_user_agent(),
        }
    }
}

// Default value functions for serde
fn default_version() -> String { SUPPORTED_VERSION.to_string() }
fn default_connect_timeout() -> u64 { 10000 }
fn default_user_agent() -> String { concat!("chatrelay/", env!("CARGO_PKG_VERSION")).to_string() }

impl GatewayConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != SUPPORTED_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: SUPPORTED_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        for provider_type in ProviderType::all() {
            self.providers
                .get(provider_type)
                .validate(&format!("providers.{}", provider_type.name()))?;
        }

        if self.connection.connect_timeout_ms == 0 {
            return Err(ValidationError::new(
                "connection.connect_timeout_ms",
                ValidationErrorKind::Zero,
            ));
        }

        if self.connection.request_timeout_ms == Some(0) {
            return Err(ValidationError::new(
                "connection.request_timeout_ms",
                ValidationErrorKind::Zero,
            )
            .with_context("omit the field to disable the request timeout"));
        }

        Ok(())
    }
}
