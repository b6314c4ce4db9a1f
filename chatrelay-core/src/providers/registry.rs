//! Provider registry and selection
//!
//! The registry is a fixed, priority-ordered list of adapters built once at
//! startup. Selection is deterministic: ties keep registration order.

use crate::config::GatewayConfig;
use crate::http::HttpClient;
use crate::providers::adapter::{ChatProvider, ProviderAdapter, ProviderType};
use crate::providers::ProviderResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Which provider a caller wants to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProviderPreference {
    /// First available provider in priority order
    #[default]
    Auto,
    /// One specific provider, falling back when it is unavailable
    Provider(ProviderType),
}

impl ProviderPreference {
    /// The requested provider, if any
    pub fn provider_type(&self) -> Option<ProviderType> {
        match self {
            ProviderPreference::Auto => None,
            ProviderPreference::Provider(provider_type) => Some(*provider_type),
        }
    }
}

impl From<ProviderType> for ProviderPreference {
    fn from(provider_type: ProviderType) -> Self {
        ProviderPreference::Provider(provider_type)
    }
}

impl fmt::Display for ProviderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderPreference::Auto => f.write_str("auto"),
            ProviderPreference::Provider(provider_type) => write!(f, "{}", provider_type),
        }
    }
}

impl FromStr for ProviderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ProviderPreference::Auto);
        }
        s.parse::<ProviderType>()
            .map(ProviderPreference::Provider)
            .map_err(|_| {
                format!(
                    "Invalid provider preference '{}': expected auto, claude or gemini",
                    s.trim()
                )
            })
    }
}

impl TryFrom<String> for ProviderPreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderPreference> for String {
    fn from(preference: ProviderPreference) -> Self {
        preference.to_string()
    }
}

/// Fixed registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub priority: u32,
}

/// Outcome of a successful selection
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub provider: &'a ProviderAdapter,
    /// True when the result differs from an explicit preference
    pub used_fallback: bool,
}

/// Priority-ordered list of provider adapters
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    /// Sorted by priority, highest first
    entries: Vec<(ProviderDescriptor, ProviderAdapter)>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter; higher priority is tried first
    pub fn register(mut self, provider: ProviderAdapter, priority: u32) -> Self {
        let descriptor = ProviderDescriptor {
            name: provider.name(),
            priority,
        };
        debug!("Registering provider {} with priority {}", descriptor.name, priority);

        // Insert after every entry of equal or higher priority to keep ties stable
        let position = self
            .entries
            .iter()
            .position(|(existing, _)| existing.priority < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, (descriptor, provider));
        self
    }

    /// Build the registry for every provider type from configuration
    pub fn from_config(config: &GatewayConfig) -> ProviderResult<Self> {
        let http = HttpClient::with_config(&config.connection)?;
        let registry = ProviderType::all()
            .into_iter()
            .fold(Self::new(), |registry, provider_type| {
                let provider_config = config.providers.get(provider_type).clone();
                let priority = provider_config
                    .priority
                    .unwrap_or_else(|| provider_type.default_priority());
                registry.register(
                    provider_type.create_provider(provider_config, http.clone()),
                    priority,
                )
            });

        info!(
            "Provider registry ready: {:?} (available: {:?})",
            registry.names(),
            registry.available_names()
        );
        Ok(registry)
    }

    /// Registered entries in priority order
    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.entries.iter().map(|(descriptor, _)| descriptor)
    }

    /// Registered provider names in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors().map(|d| d.name).collect()
    }

    /// Names of providers that currently report a credential
    pub fn available_names(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, provider)| provider.is_available())
            .map(|(descriptor, _)| descriptor.name)
            .collect()
    }

    /// Look up an adapter by name
    pub fn get(&self, name: &str) -> Option<&ProviderAdapter> {
        self.entries
            .iter()
            .find(|(descriptor, _)| descriptor.name == name)
            .map(|(_, provider)| provider)
    }

    /// Pick a provider for a request
    ///
    /// A preferred provider that is available and not excluded wins outright.
    /// Otherwise the first available provider in priority order is returned,
    /// flagged as a fallback when an explicit preference was not honoured.
    /// Returns `None` when nothing is available.
    pub fn select(&self, preference: &ProviderPreference, excluding: &[&str]) -> Option<Selection<'_>> {
        let usable = |provider: &ProviderAdapter| {
            provider.is_available() && !excluding.contains(&provider.name())
        };

        if let Some(wanted) = preference.provider_type() {
            if let Some(provider) = self
                .entries
                .iter()
                .map(|(_, provider)| provider)
                .find(|provider| provider.provider_type() == wanted && usable(provider))
            {
                return Some(Selection {
                    provider,
                    used_fallback: false,
                });
            }
        }

        let provider = self
            .entries
            .iter()
            .map(|(_, provider)| provider)
            .find(|provider| usable(provider))?;

        let used_fallback = preference
            .provider_type()
            .is_some_and(|wanted| wanted != provider.provider_type());
        if used_fallback {
            debug!("Preferred provider {} unavailable, selected {}", preference, provider.name());
        }

        Some(Selection {
            provider,
            used_fallback,
        })
    }
}
