//! Utility modules for the gateway
//!
//! - **error**: the gateway error type and its HTTP mapping
//! - **logging**: tracing subscriber setup

pub mod error;
pub mod logging;
