//! Prepaid billing
//!
//! Accounts hold a balance in cost units. Calls are admitted while the
//! balance is positive and settled once their true usage is known.

pub mod audit;
pub mod ledger;
pub mod recharge;
pub mod store;
pub mod types;

pub use audit::{AuditSink, MAX_AUDIT_ERROR_CHARS, record_or_log, truncate_error};
pub use ledger::CreditLedger;
pub use recharge::{DisabledRecharger, RechargeError, RechargeReceipt, Recharger, StripeRecharger};
pub use store::AccountStore;
pub use types::{
    AutoRecharge, CallLogEntry, CallStatus, DEFAULT_RECHARGE_CREDITS, DEFAULT_RECHARGE_PRICE_CENTS,
    DEFAULT_RECHARGE_THRESHOLD, DEFAULT_STARTING_CREDITS, MonthlyUsage, Plan, UNITS_PER_CENT,
    UserAccount,
};
