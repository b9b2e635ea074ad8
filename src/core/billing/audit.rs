//! Call audit trail

use super::types::CallLogEntry;
use crate::utils::error::Result;
use async_trait::async_trait;
use tracing::error;

/// Longest upstream error text kept in an audit row
pub const MAX_AUDIT_ERROR_CHARS: usize = 500;

/// Append-only sink for call records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record_call(&self, entry: &CallLogEntry) -> Result<()>;
}

/// Write an entry, logging instead of failing
pub async fn record_or_log(sink: &dyn AuditSink, entry: &CallLogEntry) {
    if let Err(e) = sink.record_call(entry).await {
        error!(
            user_id = %entry.user_id,
            provider = %entry.provider,
            model = %entry.model,
            cost_units = entry.cost_units,
            error = %e,
            "Failed to write audit row"
        );
    }
}

/// Clip an error body to the audit column budget on a char boundary
pub fn truncate_error(message: &str) -> String {
    message.chars().take(MAX_AUDIT_ERROR_CHARS).collect()
}
