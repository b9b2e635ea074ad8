//! Content block bookkeeping for one canonical stream
//!
//! Upstreams that do not speak the canonical protocol never announce or close
//! blocks the way the client expects. The tracker allocates canonical block
//! indices, remembers which blocks are open, and guarantees the tail of every
//! stream is: all blocks closed, one `message_delta`, one `message_stop`.

use crate::core::types::{CanonicalStreamEvent, stop_reason};
use std::collections::{BTreeSet, HashMap};

/// Per-stream block state
#[derive(Debug, Clone, Default)]
pub struct BlockTracker {
    next_index: u32,
    open: BTreeSet<u32>,
    text_block: Option<u32>,
    /// Upstream item position -> canonical index
    tool_blocks: HashMap<u64, u32>,
    /// Upstream blocks of a type the client cannot be shown
    skipped: BTreeSet<u32>,
    saw_tool_use: bool,
    message_delta_sent: bool,
    message_stop_sent: bool,
}

impl BlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        self.open.insert(index);
        index
    }

    /// Index of the open text block, opening one if needed
    pub fn ensure_text_block(&mut self, out: &mut Vec<CanonicalStreamEvent>) -> u32 {
        if let Some(index) = self.text_block {
            return index;
        }
        let index = self.allocate();
        self.text_block = Some(index);
        out.push(CanonicalStreamEvent::text_block_start(index));
        index
    }

    /// Close the text block if one is open
    pub fn close_text_block(&mut self, out: &mut Vec<CanonicalStreamEvent>) {
        if let Some(index) = self.text_block.take() {
            self.close(index, out);
        }
    }

    /// Open a tool_use block; an open text block is closed first
    pub fn open_tool_block(
        &mut self,
        upstream_key: Option<u64>,
        id: String,
        name: String,
        thought_signature: Option<String>,
        out: &mut Vec<CanonicalStreamEvent>,
    ) -> u32 {
        self.close_text_block(out);
        let index = self.allocate();
        if let Some(key) = upstream_key {
            self.tool_blocks.insert(key, index);
        }
        self.saw_tool_use = true;
        out.push(CanonicalStreamEvent::tool_use_start(
            index,
            id,
            name,
            thought_signature,
        ));
        index
    }

    /// Canonical index of a still-open tool block
    pub fn tool_block(&self, upstream_key: u64) -> Option<u32> {
        self.tool_blocks
            .get(&upstream_key)
            .copied()
            .filter(|index| self.open.contains(index))
    }

    /// Close a block; closing twice emits nothing the second time
    pub fn close(&mut self, index: u32, out: &mut Vec<CanonicalStreamEvent>) {
        if self.open.remove(&index) {
            if self.text_block == Some(index) {
                self.text_block = None;
            }
            out.push(CanonicalStreamEvent::block_stop(index));
        }
    }

    pub fn close_all(&mut self, out: &mut Vec<CanonicalStreamEvent>) {
        let open: Vec<u32> = self.open.iter().copied().collect();
        for index in open {
            self.close(index, out);
        }
    }

    /// Drop every later event addressed to `index`
    pub fn skip(&mut self, index: u32) {
        self.skipped.insert(index);
    }

    pub fn is_skipped(&self, index: u32) -> bool {
        self.skipped.contains(&index)
    }

    /// Whether any tool_use block was opened in this stream
    pub fn saw_tool_use(&self) -> bool {
        self.saw_tool_use
    }

    /// Stop reason implied by what the stream contained
    pub fn default_stop_reason(&self) -> &'static str {
        if self.saw_tool_use {
            stop_reason::TOOL_USE
        } else {
            stop_reason::END_TURN
        }
    }

    /// Close every block and emit the single `message_delta`
    pub fn finish_message(
        &mut self,
        stop_reason: &str,
        output_tokens: u64,
        out: &mut Vec<CanonicalStreamEvent>,
    ) {
        self.close_all(out);
        if !self.message_delta_sent {
            self.message_delta_sent = true;
            out.push(CanonicalStreamEvent::message_delta(stop_reason, output_tokens));
        }
    }

    /// Emit the single terminal `message_stop`
    pub fn stop(&mut self, out: &mut Vec<CanonicalStreamEvent>) {
        if !self.message_stop_sent {
            self.message_stop_sent = true;
            out.push(CanonicalStreamEvent::MessageStop);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.message_stop_sent
    }

    pub fn message_delta_sent(&self) -> bool {
        self.message_delta_sent
    }

    /// Record an event that was produced upstream and passed through as-is.
    /// Returns false when the event would break the stream shape and must be
    /// dropped (a second `message_delta` or anything after `message_stop`).
    pub fn observe_passthrough(&mut self, event: &CanonicalStreamEvent) -> bool {
        if self.message_stop_sent {
            return false;
        }
        match event {
            CanonicalStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                self.open.insert(*index);
                self.next_index = self.next_index.max(index + 1);
                if content_block.is_tool_use() {
                    self.saw_tool_use = true;
                }
            }
            CanonicalStreamEvent::ContentBlockStop { index } => {
                self.open.remove(index);
            }
            CanonicalStreamEvent::MessageDelta { .. } => {
                if self.message_delta_sent {
                    return false;
                }
                self.message_delta_sent = true;
            }
            CanonicalStreamEvent::MessageStop => {
                self.message_stop_sent = true;
            }
            _ => {}
        }
        true
    }
}
