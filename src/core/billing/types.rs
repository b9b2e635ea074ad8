//! Billing domain types
//!
//! All money amounts held by the gateway are integer cost units:
//! hundredths of a cent. Stripe prices stay in cents.

use crate::core::cost::UsageRecord;
use crate::core::providers::ProviderKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Cost units per cent
pub const UNITS_PER_CENT: i64 = 100;

/// Balance granted to new accounts ($5.00)
pub const DEFAULT_STARTING_CREDITS: i64 = 500 * UNITS_PER_CENT;
/// Balance at or below which auto-recharge fires ($1.00)
pub const DEFAULT_RECHARGE_THRESHOLD: i64 = 100 * UNITS_PER_CENT;
/// Credits added per auto-recharge ($5.00)
pub const DEFAULT_RECHARGE_CREDITS: i64 = 500 * UNITS_PER_CENT;
/// Card charge per auto-recharge, in cents
pub const DEFAULT_RECHARGE_PRICE_CENTS: i64 = 500;

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = std::convert::Infallible;

    /// Anything other than `pro` is treated as the free tier
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("pro") {
            Self::Pro
        } else {
            Self::Free
        })
    }
}

/// Per-user auto-recharge settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRecharge {
    pub enabled: bool,
    pub threshold: i64,
    pub credits: i64,
    pub price_cents: i64,
}

impl Default for AutoRecharge {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: DEFAULT_RECHARGE_THRESHOLD,
            credits: DEFAULT_RECHARGE_CREDITS,
            price_cents: DEFAULT_RECHARGE_PRICE_CENTS,
        }
    }
}

/// A billable account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
    pub credits: i64,
    pub suspended: bool,
    pub stripe_customer_id: Option<String>,
    pub auto_recharge: AutoRecharge,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Free account with the starting balance
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            plan: Plan::Free,
            credits: DEFAULT_STARTING_CREDITS,
            suspended: false,
            stripe_customer_id: None,
            auto_recharge: AutoRecharge::default(),
            last_active_at: None,
            created_at: Utc::now(),
        }
    }

    /// Pro plan with auto-recharge switched on
    pub fn can_auto_recharge(&self) -> bool {
        self.plan == Plan::Pro && self.auto_recharge.enabled
    }
}

/// Outcome recorded for one proxied call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Success,
    Error,
    /// Served, but the balance could not cover the cost
    Unpaid,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Unpaid => "unpaid",
        }
    }
}

/// One audit row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLogEntry {
    pub user_id: Uuid,
    pub provider: ProviderKind,
    pub model: String,
    pub usage: UsageRecord,
    pub cost_units: i64,
    pub duration_ms: u64,
    pub status: CallStatus,
    pub error_message: Option<String>,
}

impl CallLogEntry {
    pub fn success(
        user_id: Uuid,
        provider: ProviderKind,
        model: impl Into<String>,
        usage: UsageRecord,
        cost_units: i64,
        duration_ms: u64,
    ) -> Self {
        Self {
            user_id,
            provider,
            model: model.into(),
            usage,
            cost_units,
            duration_ms,
            status: CallStatus::Success,
            error_message: None,
        }
    }

    /// Failed call; nothing is billed
    pub fn failure(
        user_id: Uuid,
        provider: ProviderKind,
        model: impl Into<String>,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            provider,
            model: model.into(),
            usage: UsageRecord::default(),
            cost_units: 0,
            duration_ms,
            status: CallStatus::Error,
            error_message: Some(error.into()),
        }
    }
}

/// Calls and spend for the current calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyUsage {
    /// `YYYY-MM`
    pub month: String,
    pub total_calls: u64,
    pub total_cost_units: i64,
}
