//! Anthropic request and response mapping

use crate::core::cost::{UsageRecord, token_field};
use crate::core::providers::ProviderError;
use crate::core::types::{CanonicalRequest, CanonicalResponse, ContentBlock, MessageContent};
use serde_json::Value;

const PROVIDER: &str = "anthropic";

/// Canonical request minus the private fields other upstreams attach
pub(super) fn build_request(request: &CanonicalRequest) -> Result<Value, ProviderError> {
    let mut request = request.clone();
    for message in &mut request.messages {
        if let MessageContent::Blocks(blocks) = &mut message.content {
            blocks.iter_mut().for_each(strip_private_fields);
        }
    }
    serde_json::to_value(&request)
        .map_err(|e| ProviderError::invalid_request(PROVIDER, e.to_string()))
}

fn strip_private_fields(block: &mut ContentBlock) {
    match block {
        ContentBlock::ToolUse {
            thought_signature, ..
        } => *thought_signature = None,
        ContentBlock::ToolResult { tool_name, .. } => *tool_name = None,
        _ => {}
    }
}

pub(super) fn translate_response(body: Value) -> Result<CanonicalResponse, ProviderError> {
    serde_json::from_value(body)
        .map_err(|e| ProviderError::response_parsing(PROVIDER, e.to_string()))
}

/// Usage sits at the top level of responses and `message_delta` events and
/// under `message` in `message_start`
pub(super) fn extract_usage(payload: &Value) -> UsageRecord {
    let usage = payload
        .get("usage")
        .or_else(|| payload.get("message").and_then(|m| m.get("usage")));
    UsageRecord {
        input_tokens: token_field(usage, "input_tokens"),
        output_tokens: token_field(usage, "output_tokens"),
        cache_read_tokens: token_field(usage, "cache_read_input_tokens"),
        cache_creation_tokens: token_field(usage, "cache_creation_input_tokens"),
    }
}
