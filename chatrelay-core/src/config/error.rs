//! Gateway configuration errors

use std::fmt;
use thiserror::Error;

/// Failure to load or build a [`GatewayConfig`](super::GatewayConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read gateway config '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed gateway config '{path}' (line {}, column {}): {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Invalid gateway config: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Environment variable '{var}' referenced by the config is not set")]
    EnvVarNotFound { var: String },

    /// The preferred-provider variable names no known provider
    #[error("{var} must be auto, claude or gemini, got '{value}'")]
    InvalidPreference { var: String, value: String },

    #[error("Config interpolation failed: {message}")]
    Interpolation { message: String },
}

/// A setting that parsed but cannot be used
#[derive(Debug, Error)]
pub struct ValidationError {
    /// Dotted path of the offending setting, e.g. `providers.gemini.max_tokens`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    /// Hint shown after the message
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("unsupported config version '{actual}', expected '{expected}'")]
    InvalidVersion { expected: String, actual: String },

    #[error("model name is blank")]
    BlankModel,

    #[error("temperature {value} is outside 0.0..=2.0")]
    TemperatureOutOfRange { value: f32 },

    /// Token caps and timeouts
    #[error("must be greater than 0")]
    Zero,

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("URL scheme must be http or https, got '{scheme}'")]
    UnsupportedScheme { scheme: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
