//! Environment variable interpolation for configuration

use super::error::ConfigError;
use regex::Regex;
use std::env;

/// `${VAR}` or `${VAR:-default}`
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}";

fn env_var_pattern() -> Result<Regex, ConfigError> {
    Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::Interpolation {
        message: format!("invalid variable pattern: {}", e),
    })
}

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    interpolate_with(content, |name| env::var(name).ok())
}

/// Interpolate using a custom variable lookup
///
/// A reference with a default (`${VAR:-}`) never fails; a bare `${VAR}`
/// that cannot be resolved reports the first missing variable.
pub fn interpolate_with<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = env_var_pattern()?;
    let mut missing_vars = Vec::new();

    let result = pattern.replace_all(content, |caps: &regex::Captures<'_>| {
        let var_name = &caps[1];
        match (lookup(var_name), caps.get(2)) {
            (Some(value), _) => value,
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => {
                missing_vars.push(var_name.to_string());
                String::new()
            }
        }
    });

    if let Some(var) = missing_vars.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result.into_owned())
}
