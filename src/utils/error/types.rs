//! Error types for the gateway

use crate::core::providers::unified_provider::ProviderError;
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// No verified caller
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Caller is known but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Balance precheck failed and no recharge could cover it
    #[error("{0}")]
    InsufficientBalance(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Bad request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The selected upstream has no API key configured
    #[error("Provider {0} is not configured on this server")]
    ProviderNotConfigured(String),

    /// Provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Service unavailable errors
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Server lifecycle errors
    #[error("Server error: {0}")]
    Server(String),
}
