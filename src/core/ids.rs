//! Synthetic tool-call ids
//!
//! Upstreams that do not assign call ids (Google) get one minted per call
//! through an injected generator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of ids for tool calls the upstream left unnamed
pub trait ToolIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Shared generator handle
pub type SharedToolIds = Arc<dyn ToolIdGenerator>;

/// Random v4 ids, used in production
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidToolIds;

impl ToolIdGenerator for UuidToolIds {
    fn next_id(&self) -> String {
        format!("toolu_{}", Uuid::new_v4().simple())
    }
}

/// Deterministic ids, one counter per instance
#[derive(Debug, Default)]
pub struct SequentialToolIds {
    counter: AtomicU64,
}

impl SequentialToolIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToolIdGenerator for SequentialToolIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("toolu_{:04}", n)
    }
}

/// Default production generator
pub fn default_tool_ids() -> SharedToolIds {
    Arc::new(UuidToolIds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidToolIds;
        assert_ne!(ids.next_id(), ids.next_id());
        assert!(ids.next_id().starts_with("toolu_"));
    }

    #[test]
    fn test_sequential_ids_are_per_instance() {
        let a = SequentialToolIds::new();
        let b = SequentialToolIds::new();
        assert_eq!(a.next_id(), "toolu_0001");
        assert_eq!(a.next_id(), "toolu_0002");
        assert_eq!(b.next_id(), "toolu_0001");
    }
}
