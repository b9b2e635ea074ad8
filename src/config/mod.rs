//! Configuration management for the Gateway
//!
//! This module handles loading, validation, and management of all gateway configuration.
//! Values come from a YAML file, then environment variables override them.

pub mod models;

pub use models::*;

use crate::core::providers::ProviderKind;
use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.yaml";

/// Environment variable holding each upstream's API key
const PROVIDER_KEY_VARS: [(ProviderKind, &str); 3] = [
    (ProviderKind::Anthropic, "ANTHROPIC_API_KEY"),
    (ProviderKind::OpenAI, "OPENAI_API_KEY"),
    (ProviderKind::Google, "GOOGLE_API_KEY"),
];

/// Main configuration struct for the Gateway
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway configuration
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let gateway: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        debug!("Configuration file parsed");
        Ok(Self { gateway })
    }

    /// File (when present) plus environment, validated
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path).await?
        } else {
            warn!(
                "Config file {:?} not found, using defaults and environment",
                path
            );
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway = &mut self.gateway;

        if let Some(host) = lookup("GATEWAY_HOST") {
            gateway.server.host = host;
        }
        if let Some(port) = lookup("GATEWAY_PORT") {
            match port.parse() {
                Ok(port) => gateway.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid GATEWAY_PORT"),
            }
        }
        if let Some(url) = lookup("DATABASE_URL") {
            gateway.storage.database.url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            gateway.auth.jwt_secret = secret;
        }
        if let Some(surcharge) = lookup("SURCHARGE_MULTIPLIER") {
            match surcharge.parse() {
                Ok(value) => gateway.billing.surcharge_multiplier = value,
                Err(_) => warn!(value = %surcharge, "Ignoring invalid SURCHARGE_MULTIPLIER"),
            }
        }
        if let Some(key) = lookup("STRIPE_SECRET_KEY") {
            gateway.billing.recharge.stripe_secret_key = Some(key);
        }
        for (kind, var) in PROVIDER_KEY_VARS {
            if let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) {
                gateway.provider_mut(kind).api_key = Some(key);
            }
        }
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.gateway.server
    }

    /// Get providers configuration
    pub fn providers(&self) -> &[ProviderConfig] {
        &self.gateway.providers
    }

    /// Get storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.gateway.storage
    }

    /// Get auth configuration
    pub fn auth(&self) -> &AuthConfig {
        &self.gateway.auth
    }

    /// Get billing configuration
    pub fn billing(&self) -> &BillingConfig {
        &self.gateway.billing
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.gateway
            .server
            .validate()
            .map_err(|e| GatewayError::Config(format!("Server config error: {}", e)))?;

        self.gateway
            .auth
            .validate()
            .map_err(|e| GatewayError::Config(format!("Auth config error: {}", e)))?;

        self.gateway
            .storage
            .database
            .validate()
            .map_err(|e| GatewayError::Config(format!("Database config error: {}", e)))?;

        self.gateway
            .billing
            .validate()
            .map_err(|e| GatewayError::Config(format!("Billing config error: {}", e)))?;

        self.gateway
            .rate_limit
            .validate()
            .map_err(|e| GatewayError::Config(format!("Rate limit config error: {}", e)))?;

        for provider in &self.gateway.providers {
            provider
                .validate()
                .map_err(|e| GatewayError::Config(format!("Provider config error: {}", e)))?;
        }

        crate::config::models::auth::warn_insecure_config(&self.gateway.auth);

        debug!("Configuration validation completed");
        Ok(())
    }
}
