//! Rate limiter types and data structures

use std::time::Instant;

/// Rate limit result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Current request count in the window
    pub current_count: u32,
    /// Maximum requests allowed
    pub limit: u32,
    /// Remaining requests in the window
    pub remaining: u32,
    /// Time until the window resets (in seconds)
    pub reset_after_secs: u64,
    /// Retry after (in seconds, only set when not allowed)
    pub retry_after_secs: Option<u64>,
}

impl RateLimitResult {
    pub(super) fn unlimited(limit: u32) -> Self {
        Self {
            allowed: true,
            current_count: 0,
            limit,
            remaining: limit,
            reset_after_secs: 0,
            retry_after_secs: None,
        }
    }
}

/// Counter for one key's current window
#[derive(Debug, Clone)]
pub(super) struct RateLimitEntry {
    pub(super) window_start: Instant,
    pub(super) count: u32,
}

impl RateLimitEntry {
    pub(super) fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
        }
    }
}
