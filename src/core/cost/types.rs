//! Cost calculation types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token accounting for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
}

impl UsageRecord {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-model rate in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingEntry {
    pub input: f64,
    pub output: f64,
    /// Cache write rate; billed at the input rate when absent
    #[serde(default)]
    pub cache_write: Option<f64>,
    /// Cache read rate; billed at the input rate when absent
    #[serde(default)]
    pub cache_read: Option<f64>,
}

impl PricingEntry {
    pub const fn new(input: f64, output: f64) -> Self {
        Self {
            input,
            output,
            cache_write: None,
            cache_read: None,
        }
    }

    pub const fn with_cache(input: f64, output: f64, cache_write: f64, cache_read: f64) -> Self {
        Self {
            input,
            output,
            cache_write: Some(cache_write),
            cache_read: Some(cache_read),
        }
    }

    /// Undiscounted USD for the given usage
    pub fn usd(&self, usage: &UsageRecord) -> f64 {
        let per_token = |rate: f64| rate / 1_000_000.0;
        usage.input_tokens as f64 * per_token(self.input)
            + usage.output_tokens as f64 * per_token(self.output)
            + usage.cache_creation_tokens as f64 * per_token(self.cache_write.unwrap_or(self.input))
            + usage.cache_read_tokens as f64 * per_token(self.cache_read.unwrap_or(self.input))
    }

    /// Reject negative or non-finite rates
    pub fn validate(&self) -> Result<(), CostError> {
        let rates = [
            self.input,
            self.output,
            self.cache_write.unwrap_or(0.0),
            self.cache_read.unwrap_or(0.0),
        ];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(CostError::InvalidPricing(format!("{:?}", self)));
        }
        Ok(())
    }
}

/// Cost calculation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CostError {
    #[error("Surcharge multiplier must be a positive number, got {0}")]
    InvalidSurcharge(f64),

    #[error("Invalid pricing entry: {0}")]
    InvalidPricing(String),
}
