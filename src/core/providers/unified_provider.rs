//! Unified provider error handling
//!
//! One error type shared by every upstream profile.
//!
//! | Variant | Purpose | HTTP status seen by the caller |
//! |------|------|------------|
//! | UnknownProvider | Provider header names no profile | 400 |
//! | InvalidRequest | Canonical request cannot be expressed upstream | 400 |
//! | ApiError | Upstream answered with a non-2xx status | mirrors upstream |
//! | Network | Upstream unreachable or connection dropped | 502 |
//! | Timeout | Upstream did not answer within the deadline | 502 |
//! | ResponseParsing | Upstream body is not the documented shape | 502 |
//!
//! The upstream body carried by `ApiError` is for server-side logs and the
//! audit row only. It never reaches the HTTP response.

/// Unified provider error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },

    #[error("Invalid request for {provider}: {message}")]
    InvalidRequest {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Network error for {provider}: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("Timeout for {provider}: {message}")]
    Timeout {
        provider: &'static str,
        message: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    ResponseParsing {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Create unknown provider error
    pub fn unknown_provider(name: impl Into<String>) -> Self {
        Self::UnknownProvider { name: name.into() }
    }

    /// Create invalid request error
    pub fn invalid_request(provider: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            provider,
            message: message.into(),
        }
    }

    /// Create API error with status code
    pub fn api_error(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Create network error
    pub fn network(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Network {
            provider,
            message: message.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider,
            message: message.into(),
        }
    }

    /// Create response parsing error
    pub fn response_parsing(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            provider,
            message: message.into(),
        }
    }

    /// Classify a transport failure from the HTTP client
    pub fn from_transport(provider: &'static str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(provider, err.to_string())
        } else {
            Self::network(provider, err.to_string())
        }
    }

    /// Get the provider name that caused this error
    pub fn provider(&self) -> &str {
        match self {
            Self::UnknownProvider { name } => name,
            Self::InvalidRequest { provider, .. }
            | Self::ApiError { provider, .. }
            | Self::Network { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::ResponseParsing { provider, .. } => provider,
        }
    }

    /// Detail recorded in the audit log, truncated to 500 characters
    pub fn audit_message(&self) -> String {
        let detail = match self {
            Self::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        };
        detail.chars().take(500).collect()
    }

    /// Whether the upstream was reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}
