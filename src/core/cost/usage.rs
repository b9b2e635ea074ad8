//! Usage metering across a call
//!
//! Upstreams report usage at different points of a stream (Anthropic splits
//! input and output across `message_start` and `message_delta`, OpenAI only
//! reports on completion). The meter keeps, per field, the last non-zero
//! value it has seen.

use super::calculator::PricingTable;
use super::types::UsageRecord;
use serde_json::Value;

/// Accumulates usage samples for one call
#[derive(Debug, Clone, Default)]
pub struct UsageMeter {
    record: UsageRecord,
}

impl UsageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one sample; zero fields never overwrite earlier values
    pub fn observe(&mut self, sample: UsageRecord) {
        let fields = [
            (&mut self.record.input_tokens, sample.input_tokens),
            (&mut self.record.output_tokens, sample.output_tokens),
            (&mut self.record.cache_read_tokens, sample.cache_read_tokens),
            (&mut self.record.cache_creation_tokens, sample.cache_creation_tokens),
        ];
        for (slot, value) in fields {
            if value != 0 {
                *slot = value;
            }
        }
    }

    pub fn record(&self) -> UsageRecord {
        self.record
    }

    /// Final cost in cost units
    pub fn cost_units(&self, pricing: &PricingTable, model: &str) -> i64 {
        pricing.cost_units(&self.record, model)
    }
}

/// Read a non-negative integer field, treating anything else as zero
pub fn token_field(object: Option<&Value>, key: &str) -> u64 {
    object
        .and_then(|o| o.get(key))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}
