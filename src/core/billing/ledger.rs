//! Credit ledger
//!
//! Gatekeeps calls on the balance, settles finished calls with one
//! conditional decrement, writes the audit row and tops accounts up.

use super::audit::{AuditSink, record_or_log};
use super::recharge::{RechargeError, Recharger};
use super::store::AccountStore;
use super::types::{CallLogEntry, CallStatus, Plan, UserAccount};
use crate::core::cost::PricingTable;
use crate::core::types::BalanceMeta;
use crate::utils::error::{GatewayError, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const MSG_RECHARGE_FAILED: &str =
    "Insufficient balance. Auto-recharge failed. Add funds to your account to continue.";
pub const MSG_INSUFFICIENT_PRO: &str =
    "Insufficient balance. Add funds to your account to continue.";
pub const MSG_TRIAL_DEPLETED: &str =
    "Free trial balance depleted. Subscribe to a plan to continue.";

/// Balance gatekeeper and settlement for proxied calls
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn AccountStore>,
    audit: Arc<dyn AuditSink>,
    recharger: Arc<dyn Recharger>,
    pricing: Arc<PricingTable>,
    recharging: Arc<Mutex<HashSet<Uuid>>>,
}

/// Removes a user from the in-flight recharge set when dropped
struct RechargeClaim {
    user_id: Uuid,
    recharging: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for RechargeClaim {
    fn drop(&mut self) {
        self.recharging.lock().remove(&self.user_id);
    }
}

impl CreditLedger {
    pub fn new(
        store: Arc<dyn AccountStore>,
        audit: Arc<dyn AuditSink>,
        recharger: Arc<dyn Recharger>,
        pricing: Arc<PricingTable>,
    ) -> Self {
        Self {
            store,
            audit,
            recharger,
            pricing,
            recharging: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Refuse a call up front when the balance is exhausted.
    ///
    /// Pro accounts with auto-recharge get one synchronous top-up attempt.
    pub async fn precheck(&self, account: &UserAccount) -> Result<()> {
        if account.credits > 0 {
            return Ok(());
        }

        if account.can_auto_recharge() {
            debug!(user_id = %account.id, "Balance exhausted, attempting synchronous recharge");
            return match self.recharge(account).await {
                Ok(balance) if balance > 0 => Ok(()),
                Ok(_) => Err(GatewayError::insufficient_balance(MSG_RECHARGE_FAILED)),
                Err(e) => {
                    warn!(user_id = %account.id, error = %e, "Synchronous recharge failed");
                    Err(GatewayError::insufficient_balance(MSG_RECHARGE_FAILED))
                }
            };
        }

        Err(GatewayError::insufficient_balance(match account.plan {
            Plan::Pro => MSG_INSUFFICIENT_PRO,
            Plan::Free => MSG_TRIAL_DEPLETED,
        }))
    }

    /// Deduct the true cost of a finished call and audit it.
    ///
    /// The decrement is conditional on the balance covering the cost; a
    /// refused decrement leaves the balance untouched and the call is
    /// recorded as unpaid.
    pub async fn settle(&self, account: &UserAccount, mut entry: CallLogEntry) -> BalanceMeta {
        let cost = self.pricing.cost_units(&entry.usage, &entry.model);
        entry.cost_units = cost;

        if cost > 0 {
            match self.store.deduct_credits(account.id, cost).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        user_id = %account.id,
                        cost_units = cost,
                        "Balance does not cover call cost, recording as unpaid"
                    );
                    entry.status = CallStatus::Unpaid;
                }
                Err(e) => {
                    error!(user_id = %account.id, cost_units = cost, error = %e, "Credit deduction failed");
                    entry.status = CallStatus::Unpaid;
                }
            }
        }

        record_or_log(self.audit.as_ref(), &entry).await;

        let credits = match self.store.find_account(account.id).await {
            Ok(Some(current)) => current.credits,
            Ok(None) => 0,
            Err(e) => {
                warn!(user_id = %account.id, error = %e, "Could not read balance after settlement");
                if entry.status == CallStatus::Success {
                    account.credits - cost
                } else {
                    account.credits
                }
            }
        };

        debug!(
            user_id = %account.id,
            model = %entry.model,
            cost_units = cost,
            credits,
            "Call settled"
        );

        if account.can_auto_recharge() && credits <= account.auto_recharge.threshold {
            self.spawn_recharge(account.clone());
        }

        BalanceMeta {
            credits,
            cost_units: cost,
        }
    }

    /// Audit a call that produced nothing billable
    pub async fn record_failure(&self, entry: CallLogEntry) {
        record_or_log(self.audit.as_ref(), &entry).await;
    }

    /// Charge the card and credit the account; at most one per user at a time
    pub async fn recharge(&self, account: &UserAccount) -> std::result::Result<i64, RechargeError> {
        let _claim = self.claim(account.id).ok_or(RechargeError::InProgress)?;

        let receipt = self.recharger.charge(account).await?;
        let balance = self
            .store
            .add_credits(account.id, account.auto_recharge.credits)
            .await
            .map_err(|e| RechargeError::Storage(e.to_string()))?
            .ok_or_else(|| RechargeError::Storage("account disappeared".to_string()))?;

        info!(
            user_id = %account.id,
            payment_intent = %receipt.payment_intent_id,
            credits_added = account.auto_recharge.credits,
            balance,
            "Account recharged"
        );
        Ok(balance)
    }

    /// Background top-up after a call left the balance at or under threshold
    pub fn spawn_recharge(&self, account: UserAccount) {
        if self.recharging.lock().contains(&account.id) {
            debug!(user_id = %account.id, "Recharge already in flight");
            return;
        }
        let ledger = self.clone();
        tokio::spawn(async move {
            match ledger.recharge(&account).await {
                Ok(_) | Err(RechargeError::InProgress) => {}
                Err(e) => warn!(user_id = %account.id, error = %e, "Auto-recharge failed"),
            }
        });
    }

    fn claim(&self, user_id: Uuid) -> Option<RechargeClaim> {
        self.recharging.lock().insert(user_id).then(|| RechargeClaim {
            user_id,
            recharging: self.recharging.clone(),
        })
    }
}

impl std::fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditLedger")
            .field("surcharge", &self.pricing.surcharge())
            .field("recharging", &self.recharging.lock().len())
            .finish()
    }
}
