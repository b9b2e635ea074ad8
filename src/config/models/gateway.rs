//! Main gateway configuration

#![allow(missing_docs)]

use super::*;
use crate::core::providers::ProviderKind;
use serde::{Deserialize, Serialize};

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Provider configurations
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Pricing and credit settings
    #[serde(default)]
    pub billing: BillingConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Entry for an upstream, if one is configured
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.provider_type == kind)
    }

    /// Entry for an upstream, created with defaults if missing
    pub fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        let position = match self.providers.iter().position(|p| p.provider_type == kind) {
            Some(position) => position,
            None => {
                self.providers.push(ProviderConfig::new(kind));
                self.providers.len() - 1
            }
        };
        &mut self.providers[position]
    }
}
