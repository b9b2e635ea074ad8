//! Type definitions for streaming responses

use crate::core::types::{BalanceMeta, CanonicalStreamEvent};
use actix_web::web;
use serde::Serialize;

/// Name of the trailer frame carrying the post-settlement balance
pub const BALANCE_EVENT: &str = "balance";

/// Simple Event structure for SSE compatibility
#[derive(Debug, Clone, Default)]
pub struct Event {
    /// Event type
    pub event: Option<String>,
    /// Event data
    pub data: String,
}

impl Event {
    /// Create a new empty event
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event type
    pub fn event(mut self, event: &str) -> Self {
        self.event = Some(event.to_string());
        self
    }

    /// Set the event data
    pub fn data(mut self, data: &str) -> Self {
        self.data = data.to_string();
        self
    }

    /// Frame for a canonical event, named after its type
    pub fn from_canonical(event: &CanonicalStreamEvent) -> serde_json::Result<Self> {
        Ok(Self::new()
            .event(event.event_name())
            .data(&serde_json::to_string(event)?))
    }

    /// Trailer frame sent after settlement
    pub fn balance(meta: BalanceMeta) -> serde_json::Result<Self> {
        let trailer = BalanceTrailer {
            kind: BALANCE_EVENT,
            credits: meta.credits,
            cost_units: meta.cost_units,
        };
        Ok(Self::new()
            .event(BALANCE_EVENT)
            .data(&serde_json::to_string(&trailer)?))
    }

    /// Convert event to bytes for SSE transmission
    pub fn to_bytes(&self) -> web::Bytes {
        let mut result = String::new();
        if let Some(event) = &self.event {
            result.push_str(&format!("event: {}\n", event));
        }
        result.push_str(&format!("data: {}\n\n", self.data));
        web::Bytes::from(result)
    }
}

#[derive(Debug, Serialize)]
struct BalanceTrailer {
    #[serde(rename = "type")]
    kind: &'static str,
    credits: i64,
    cost_units: i64,
}
