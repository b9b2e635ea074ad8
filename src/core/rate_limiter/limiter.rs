//! Core rate limiter implementation

use super::types::{RateLimitEntry, RateLimitResult};
use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Rate limiter implementation
#[derive(Debug, Clone)]
pub struct RateLimiter {
    pub(super) config: RateLimitConfig,
    /// Entries by key (user id)
    pub(super) entries: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    pub(super) window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_secs);
        Self {
            config,
            entries: Arc::new(RwLock::new(HashMap::new())),
            window,
        }
    }

    /// Check a request against the key's window and count it if allowed
    pub async fn check_and_record(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now()).await
    }

    pub(super) async fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        let limit = self.config.max_requests;
        if !self.config.enabled {
            return RateLimitResult::unlimited(limit);
        }

        let mut entries = self.entries.write().await;
        // Avoid String allocation if key already exists
        let entry = if let Some(e) = entries.get_mut(key) {
            e
        } else {
            entries
                .entry(key.to_string())
                .or_insert_with(|| RateLimitEntry::new(now))
        };

        if now.duration_since(entry.window_start) >= self.window {
            *entry = RateLimitEntry::new(now);
        }

        let elapsed = now.duration_since(entry.window_start);
        let reset_after_secs = self.window.saturating_sub(elapsed).as_secs();
        let allowed = entry.count < limit;

        if allowed {
            entry.count += 1;
        } else {
            debug!(
                "Rate limit exceeded for {}: {}/{} requests",
                key, entry.count, limit
            );
        }

        RateLimitResult {
            allowed,
            current_count: entry.count,
            limit,
            remaining: limit.saturating_sub(entry.count),
            reset_after_secs,
            retry_after_secs: (!allowed).then_some(reset_after_secs.max(1)),
        }
    }

    /// Drop windows that have fully expired
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.window_start) < self.window);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Cleaned up {} expired rate limit entries", removed);
        }
    }

    /// Periodically prune expired windows in the background
    pub fn start_cleanup_task(&self) {
        let limiter = self.clone();
        let period = self.window.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    /// Number of tracked keys
    pub async fn tracked_keys(&self) -> usize {
        self.entries.read().await.len()
    }
}
