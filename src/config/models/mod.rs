//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

#![allow(missing_docs)]

pub mod auth;
pub mod billing;
pub mod gateway;
pub mod logging;
pub mod provider;
pub mod rate_limit;
pub mod server;
pub mod storage;

// Re-export all configuration types
pub use auth::*;
pub use billing::*;
pub use gateway::*;
pub use logging::*;
pub use provider::*;
pub use rate_limit::*;
pub use server::*;
pub use storage::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

/// Default one-shot upstream timeout in seconds
pub fn default_upstream_timeout() -> u64 {
    120
}

pub fn default_connect_timeout() -> u64 {
    10
}

pub fn default_true() -> bool {
    true
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_jwt_expiration() -> u64 {
    86400 // 24 hours
}

/// Minimum gap between two `last_active_at` writes for one user
pub fn default_activity_debounce() -> u64 {
    300
}

pub fn default_database_url() -> String {
    "sqlite://creditgate.db?mode=rwc".to_string()
}
