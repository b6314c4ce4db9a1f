//! Configuration module for the chat gateway
//!
//! Provides the configuration schema, file loaders with `${VAR}` interpolation,
//! environment-based construction, and credential redaction.

mod env;
mod error;
mod schema;
mod secrets;

pub use env::{interpolate_env_vars, interpolate_with};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ChatProviderConfig, ConnectionConfig, GatewayConfig, ProvidersConfig, SUPPORTED_VERSION,
};
pub use secrets::{SafeLogging, SecretString};

use crate::providers::{ProviderPreference, ProviderType};
use std::fs;
use std::path::Path;

/// Environment variable holding the preferred provider (`auto`, `claude`, `gemini`)
pub const PREFERRED_PROVIDER_ENV: &str = "AI_CHAT_PROVIDER";

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: GatewayConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    let interpolated = env::interpolate_env_vars(&content)?;

    let config: GatewayConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    config.validate()?;
    Ok(config)
}

impl GatewayConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    ///
    /// Reads each provider's key and model variables plus
    /// [`PREFERRED_PROVIDER_ENV`]. Blank values are treated as unset.
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = GatewayConfig::default();
        for provider_type in ProviderType::all() {
            let provider_config = ChatProviderConfig {
                api_key: read(provider_type.api_key_env()).map(SecretString::new),
                model: read(provider_type.model_env()),
                ..Default::default()
            };
            match provider_type {
                ProviderType::Claude => config.providers.claude = provider_config,
                ProviderType::Gemini => config.providers.gemini = provider_config,
            }
        }

        if let Some(preference) = read(PREFERRED_PROVIDER_ENV) {
            config.preferred_provider = preference.parse::<ProviderPreference>().map_err(|_| {
                ConfigError::InvalidPreference {
                    var: PREFERRED_PROVIDER_ENV.to_string(),
                    value: preference.clone(),
                }
            })?;
        }

        config.validate()?;
        Ok(config)
    }
}
