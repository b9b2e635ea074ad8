//! Streaming support
//!
//! Byte-level transcoding of upstream SSE into canonical events, plus the
//! SSE framing and settlement around it.

pub mod blocks;
pub mod handler;
pub mod transcoder;
pub mod types;

pub use blocks::BlockTracker;
pub use handler::{SettleFn, StreamOutcome, create_sse_stream};
pub use transcoder::{TranscoderState, feed, finish};
pub use types::{BALANCE_EVENT, Event};
