//! Canonical non-streaming response

use super::content::ContentBlock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token counts reported back to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    /// Cache counters and any other upstream extras
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Balance snapshot attached to a settled call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMeta {
    pub credits: i64,
    pub cost_units: i64,
}

/// Canonical response for a one-shot call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    pub content: Vec<ContentBlock>,
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: ResponseUsage,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BalanceMeta>,
    /// Upstream fields passed through unchanged (id, role, stop_sequence)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanonicalResponse {
    pub fn new(
        content: Vec<ContentBlock>,
        model: impl Into<String>,
        stop_reason: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Self {
        Self {
            content,
            model: model.into(),
            stop_reason: Some(stop_reason.to_string()),
            usage: ResponseUsage {
                input_tokens,
                output_tokens,
                extra: Map::new(),
            },
            meta: None,
            extra: Map::new(),
        }
    }

    /// Concatenated text of every text block
    pub fn text(&self) -> String {
        self.content.iter().filter_map(|b| b.as_text()).collect()
    }
}
