//! OpenAI Responses stream events
//!
//! Text deltas carry no block framing upstream, so the text block is opened
//! lazily. Function calls are keyed by `output_index` until their arguments
//! are done.

use crate::core::cost::token_field;
use crate::core::ids::ToolIdGenerator;
use crate::core::streaming::BlockTracker;
use crate::core::types::{CanonicalStreamEvent, stop_reason};
use serde_json::Value;

pub(super) fn translate_chunk(
    payload: &Value,
    blocks: &mut BlockTracker,
    ids: &dyn ToolIdGenerator,
) -> Vec<CanonicalStreamEvent> {
    let mut out = Vec::new();
    let Some(event_type) = payload.get("type").and_then(Value::as_str) else {
        return out;
    };
    let output_index = payload.get("output_index").and_then(Value::as_u64);

    match event_type {
        "response.output_text.delta" => {
            let delta = payload.get("delta").and_then(Value::as_str).unwrap_or_default();
            if !delta.is_empty() {
                let index = blocks.ensure_text_block(&mut out);
                out.push(CanonicalStreamEvent::text_delta(index, delta));
            }
        }
        "response.output_item.added" => {
            let item = payload.get("item").unwrap_or(&Value::Null);
            if item.get("type").and_then(Value::as_str) == Some("function_call") {
                let id = item
                    .get("call_id")
                    .or_else(|| item.get("id"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| ids.next_id());
                let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
                blocks.open_tool_block(output_index, id, name.to_string(), None, &mut out);
            }
        }
        "response.function_call_arguments.delta" => {
            if let Some(index) = output_index.and_then(|key| blocks.tool_block(key)) {
                let delta = payload.get("delta").and_then(Value::as_str).unwrap_or_default();
                out.push(CanonicalStreamEvent::input_json_delta(index, delta));
            }
        }
        "response.function_call_arguments.done" => {
            if let Some(index) = output_index.and_then(|key| blocks.tool_block(key)) {
                blocks.close(index, &mut out);
            }
        }
        "response.completed" => {
            let response = payload.get("response");
            let has_tool_calls = response
                .and_then(|r| r.get("output"))
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items
                        .iter()
                        .any(|item| item.get("type").and_then(Value::as_str) == Some("function_call"))
                });
            let stop = if has_tool_calls {
                stop_reason::TOOL_USE
            } else {
                blocks.default_stop_reason()
            };
            let usage = response.and_then(|r| r.get("usage"));
            blocks.finish_message(stop, token_field(usage, "output_tokens"), &mut out);
        }
        "response.failed" => {
            blocks.finish_message(stop_reason::ERROR, 0, &mut out);
        }
        "response.incomplete" => {
            let usage = payload.get("response").and_then(|r| r.get("usage"));
            blocks.finish_message(
                stop_reason::END_TURN,
                token_field(usage, "output_tokens"),
                &mut out,
            );
        }
        _ => {}
    }

    out
}
