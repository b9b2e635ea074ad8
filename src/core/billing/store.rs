//! Account persistence seen by the ledger

use super::types::UserAccount;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Balance reads and writes for billable accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, user_id: Uuid) -> Result<Option<UserAccount>>;

    /// Conditional decrement; `false` when the balance does not cover `amount`
    async fn deduct_credits(&self, user_id: Uuid, amount: i64) -> Result<bool>;

    /// Increment; returns the new balance
    async fn add_credits(&self, user_id: Uuid, amount: i64) -> Result<Option<i64>>;

    /// Record activity unless the last stamp is newer than `stale_before`
    async fn touch_last_active(&self, user_id: Uuid, stale_before: DateTime<Utc>) -> Result<bool>;
}
