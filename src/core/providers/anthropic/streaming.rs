//! Anthropic stream events
//!
//! Events are already canonical. They are parsed so the block tracker can
//! follow the stream, then passed through unchanged.

use crate::core::streaming::BlockTracker;
use crate::core::types::CanonicalStreamEvent;
use serde_json::Value;
use tracing::debug;

pub(super) fn translate_chunk(payload: Value, blocks: &mut BlockTracker) -> Vec<CanonicalStreamEvent> {
    let index = payload
        .get("index")
        .and_then(Value::as_u64)
        .and_then(|i| u32::try_from(i).ok());
    if let Some(index) = index {
        if blocks.is_skipped(index) {
            debug!(index, "Dropping event for skipped anthropic block");
            return Vec::new();
        }
    }
    let is_block_start = payload.get("type").and_then(Value::as_str) == Some("content_block_start");

    match serde_json::from_value::<CanonicalStreamEvent>(payload) {
        Ok(event) if blocks.observe_passthrough(&event) => vec![event],
        Ok(event) => {
            debug!(event = event.event_name(), "Dropping out-of-order anthropic event");
            Vec::new()
        }
        Err(e) => {
            // Its deltas and stop would reference a block the client never saw
            if let (true, Some(index)) = (is_block_start, index) {
                blocks.skip(index);
            }
            debug!(error = %e, "Skipping unrecognized anthropic event");
            Vec::new()
        }
    }
}
