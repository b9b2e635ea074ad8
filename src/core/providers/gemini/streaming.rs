//! Gemini stream frames
//!
//! Each SSE frame is a whole `GenerateContentResponse`. Function calls
//! arrive complete, so each one becomes a start, a single argument delta
//! and a stop. A `finishReason` may share a frame with content.

use super::transformer::finish_reason_to_stop;
use crate::core::cost::token_field;
use crate::core::ids::ToolIdGenerator;
use crate::core::streaming::BlockTracker;
use crate::core::types::{CanonicalStreamEvent, stop_reason};
use serde_json::{Value, json};

pub(super) fn translate_chunk(
    payload: &Value,
    blocks: &mut BlockTracker,
    ids: &dyn ToolIdGenerator,
) -> Vec<CanonicalStreamEvent> {
    let mut out = Vec::new();
    let Some(candidate) = payload.get("candidates").and_then(|c| c.get(0)) else {
        return out;
    };

    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for part in parts {
        if let Some(call) = part.get("functionCall") {
            let name = call.get("name").and_then(Value::as_str).unwrap_or_default();
            let signature = part
                .get("thoughtSignature")
                .and_then(Value::as_str)
                .map(str::to_string);
            let index = blocks.open_tool_block(None, ids.next_id(), name.to_string(), signature, &mut out);
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            out.push(CanonicalStreamEvent::input_json_delta(index, args.to_string()));
            blocks.close(index, &mut out);
            continue;
        }
        if part.get("thought").and_then(Value::as_bool) == Some(true) {
            continue;
        }
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                let index = blocks.ensure_text_block(&mut out);
                out.push(CanonicalStreamEvent::text_delta(index, text));
            }
        }
    }

    if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
        let stop = if blocks.saw_tool_use() {
            stop_reason::TOOL_USE
        } else {
            finish_reason_to_stop(Some(reason))
        };
        let output_tokens = token_field(payload.get("usageMetadata"), "candidatesTokenCount");
        blocks.finish_message(stop, output_tokens, &mut out);
    }

    out
}
