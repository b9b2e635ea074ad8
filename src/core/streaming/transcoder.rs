//! Incremental upstream SSE -> canonical event transcoding
//!
//! Bytes are buffered until a newline so that lines (and UTF-8 sequences)
//! split across reads are never decoded early. Only complete `data:` lines
//! are dispatched to the provider profile.

use super::blocks::BlockTracker;
use crate::core::cost::{UsageMeter, UsageRecord};
use crate::core::ids::ToolIdGenerator;
use crate::core::providers::ProviderProfile;
use crate::core::types::CanonicalStreamEvent;
use serde_json::Value;
use tracing::debug;

const DONE_SENTINEL: &str = "[DONE]";

/// Per-connection transcoding state, threaded through [`feed`] and [`finish`]
#[derive(Debug, Default)]
pub struct TranscoderState {
    /// Bytes after the last newline seen so far
    buffer: Vec<u8>,
    blocks: BlockTracker,
    meter: UsageMeter,
    finished: bool,
}

impl TranscoderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Usage observed so far
    pub fn usage(&self) -> UsageRecord {
        self.meter.record()
    }

    /// Whether the terminal `message_stop` has been emitted
    pub fn is_stopped(&self) -> bool {
        self.blocks.is_stopped()
    }

    /// Bytes held back waiting for a newline
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

/// Consume one upstream read and return the canonical events it completes
pub fn feed(
    state: &mut TranscoderState,
    profile: &dyn ProviderProfile,
    ids: &dyn ToolIdGenerator,
    chunk: &[u8],
) -> Vec<CanonicalStreamEvent> {
    let mut out = Vec::new();
    if state.finished {
        return out;
    }
    state.buffer.extend_from_slice(chunk);

    let Some(last_newline) = state.buffer.iter().rposition(|b| *b == b'\n') else {
        return out;
    };
    let complete: Vec<u8> = state.buffer.drain(..=last_newline).collect();
    for line in complete.split(|b| *b == b'\n') {
        process_line(state, profile, ids, line, &mut out);
    }
    out
}

/// Flush the held-back fragment and emit whatever terminal events the
/// upstream never sent. Calling it twice emits nothing the second time.
pub fn finish(
    state: &mut TranscoderState,
    profile: &dyn ProviderProfile,
    ids: &dyn ToolIdGenerator,
) -> Vec<CanonicalStreamEvent> {
    let mut out = Vec::new();
    if state.finished {
        return out;
    }

    let rest = std::mem::take(&mut state.buffer);
    if !rest.is_empty() {
        process_line(state, profile, ids, &rest, &mut out);
    }

    if !state.blocks.is_stopped() {
        let stop = state.blocks.default_stop_reason();
        let output_tokens = state.meter.record().output_tokens;
        state.blocks.finish_message(stop, output_tokens, &mut out);
        state.blocks.stop(&mut out);
    }
    state.finished = true;
    out
}

fn process_line(
    state: &mut TranscoderState,
    profile: &dyn ProviderProfile,
    ids: &dyn ToolIdGenerator,
    line: &[u8],
    out: &mut Vec<CanonicalStreamEvent>,
) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let Some(data) = line.strip_prefix(b"data:") else {
        // event:, id:, retry:, comments and blank separators
        return;
    };
    let data = match std::str::from_utf8(data) {
        Ok(data) => data.trim(),
        Err(e) => {
            debug!(error = %e, "Dropping SSE line with invalid UTF-8");
            return;
        }
    };
    if data.is_empty() {
        return;
    }

    if data == DONE_SENTINEL {
        let stop = state.blocks.default_stop_reason();
        let output_tokens = state.meter.record().output_tokens;
        state.blocks.finish_message(stop, output_tokens, out);
        state.blocks.stop(out);
        return;
    }

    let payload: Value = match serde_json::from_str(data) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(
                provider = %profile.kind(),
                error = %e,
                "Dropping unparseable stream payload"
            );
            return;
        }
    };

    state.meter.observe(profile.extract_usage(&payload));
    if state.blocks.is_stopped() {
        return;
    }
    out.extend(profile.translate_chunk(payload, &mut state.blocks, ids));
}
