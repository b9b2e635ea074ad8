//! Rate Limiting Implementation
//!
//! Fixed-window per-key counters for the proxy route

mod limiter;
mod types;


// Re-export public types
pub use limiter::RateLimiter;
pub use types::RateLimitResult;
