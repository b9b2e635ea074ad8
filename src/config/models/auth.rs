//! Authentication configuration

use super::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    #[serde(default)]
    pub jwt_secret: String,
    /// JWT expiration in seconds, used when this gateway mints tokens
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,
    /// Seconds between two activity timestamp writes per user
    #[serde(default = "default_activity_debounce")]
    pub activity_debounce: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expiration: default_jwt_expiration(),
            activity_debounce: default_activity_debounce(),
        }
    }
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.len() < 32 {
            return Err(
                "JWT secret must be at least 32 characters long for security".to_string(),
            );
        }

        if self.jwt_expiration < 300 {
            return Err("JWT expiration should be at least 5 minutes (300 seconds)".to_string());
        }

        Ok(())
    }
}

/// Warn about settings that are valid but unwise
pub fn warn_insecure_config(config: &AuthConfig) {
    if config.jwt_secret.chars().all(|c| c.is_ascii_lowercase()) {
        warn!("JWT secret only contains lowercase letters; use a random secret");
    }
    if config.jwt_expiration > 86400 * 30 {
        warn!(
            expiration = config.jwt_expiration,
            "JWT expiration exceeds 30 days"
        );
    }
}
