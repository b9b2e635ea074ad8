//! Canonical protocol types
//!
//! The single content-block shape the gateway exposes to its own clients,
//! independent of which upstream serves the call.

pub mod content;
pub mod events;
pub mod request;
pub mod response;

pub use content::{ContentBlock, tool_result_text};
pub use events::{CanonicalStreamEvent, ContentDelta, MessageDeltaBody, stop_reason};
pub use request::{
    CanonicalRequest, DEFAULT_MAX_TOKENS, Message, MessageContent, Role, SystemBlock,
    SystemPrompt, Tool, ToolChoice,
};
pub use response::{BalanceMeta, CanonicalResponse, ResponseUsage};
