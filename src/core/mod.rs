//! Core functionality for the gateway
//!
//! Protocol types, provider profiles, streaming transcoding, metering and
//! billing. Nothing in here knows about HTTP routing.

pub mod billing;
pub mod cost;
pub mod ids;
pub mod providers;
pub mod proxy;
pub mod rate_limiter;
pub mod streaming;
pub mod types;
