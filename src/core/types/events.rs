//! Canonical stream events

use super::content::ContentBlock;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Stop reasons produced by the gateway itself
pub mod stop_reason {
    pub const END_TURN: &str = "end_turn";
    pub const TOOL_USE: &str = "tool_use";
    pub const ERROR: &str = "error";
}

/// Incremental content for an open block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
}

/// Body of a `message_delta` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,
}

/// One wire event sent to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanonicalStreamEvent {
    MessageStart {
        message: Value,
    },
    ContentBlockStart {
        index: u32,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: ContentDelta,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        delta: MessageDeltaBody,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Value>,
    },
    MessageStop,
    Ping,
    Error {
        error: Value,
    },
}

impl CanonicalStreamEvent {
    /// Name used on the SSE `event:` line
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::ContentBlockStart { .. } => "content_block_start",
            Self::ContentBlockDelta { .. } => "content_block_delta",
            Self::ContentBlockStop { .. } => "content_block_stop",
            Self::MessageDelta { .. } => "message_delta",
            Self::MessageStop => "message_stop",
            Self::Ping => "ping",
            Self::Error { .. } => "error",
        }
    }

    pub fn text_block_start(index: u32) -> Self {
        Self::ContentBlockStart {
            index,
            content_block: ContentBlock::text(""),
        }
    }

    pub fn tool_use_start(
        index: u32,
        id: impl Into<String>,
        name: impl Into<String>,
        thought_signature: Option<String>,
    ) -> Self {
        Self::ContentBlockStart {
            index,
            content_block: ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input: json!({}),
                thought_signature,
            },
        }
    }

    pub fn text_delta(index: u32, text: impl Into<String>) -> Self {
        Self::ContentBlockDelta {
            index,
            delta: ContentDelta::TextDelta { text: text.into() },
        }
    }

    pub fn input_json_delta(index: u32, partial_json: impl Into<String>) -> Self {
        Self::ContentBlockDelta {
            index,
            delta: ContentDelta::InputJsonDelta {
                partial_json: partial_json.into(),
            },
        }
    }

    pub fn block_stop(index: u32) -> Self {
        Self::ContentBlockStop { index }
    }

    pub fn message_delta(stop_reason: &str, output_tokens: u64) -> Self {
        Self::MessageDelta {
            delta: MessageDeltaBody {
                stop_reason: Some(stop_reason.to_string()),
                stop_sequence: None,
            },
            usage: Some(json!({ "output_tokens": output_tokens })),
        }
    }
}
