//! Provider configuration

use super::*;
use crate::core::providers::ProviderKind;
use serde::{Deserialize, Serialize};

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name
    pub name: String,
    /// Which upstream family this entry configures
    pub provider_type: ProviderKind,
    /// API key; a provider without one is reported as not configured
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// One-shot request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout: u64,
    /// Connect timeout in seconds, applied to streaming calls as well
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Whether provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            name: kind.as_str().to_string(),
            provider_type: kind,
            api_key: None,
            base_url: None,
            timeout: default_upstream_timeout(),
            connect_timeout: default_connect_timeout(),
            enabled: true,
        }
    }

    /// Usable API key: enabled and non-blank
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|key| self.enabled && !key.trim().is_empty())
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err(format!("Provider {} timeout cannot be 0", self.name));
        }
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url)
                .map_err(|e| format!("Provider {} base_url is invalid: {}", self.name, e))?;
        }
        Ok(())
    }
}
