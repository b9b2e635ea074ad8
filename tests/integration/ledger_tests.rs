//! Credit settlement against a real database

use crate::common::fixtures::AccountFactory;
use crate::common::TestDatabase;
use async_trait::async_trait;
use chrono::Utc;
use creditgate::core::billing::{
    AccountStore, AuditSink, CallLogEntry, CreditLedger, DisabledRecharger, RechargeError,
    RechargeReceipt, Recharger, UserAccount,
    ledger::{MSG_RECHARGE_FAILED, MSG_TRIAL_DEPLETED},
};
use creditgate::core::cost::{PricingTable, UsageRecord};
use creditgate::core::providers::ProviderKind;
use creditgate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 10k sonnet input tokens at list price: 300 units
const SONNET_CALL_UNITS: i64 = 300;

fn sonnet_call(account: &UserAccount) -> CallLogEntry {
    CallLogEntry::success(
        account.id,
        ProviderKind::Anthropic,
        "claude-sonnet-4-6",
        UsageRecord::new(10_000, 0),
        0,
        40,
    )
}

fn ledger_with(db: &TestDatabase, audit: Arc<dyn AuditSink>, recharger: Arc<dyn Recharger>) -> CreditLedger {
    let store: Arc<dyn AccountStore> = db.db_arc();
    CreditLedger::new(
        store,
        audit,
        recharger,
        Arc::new(PricingTable::new(1.0).unwrap()),
    )
}

fn ledger(db: &TestDatabase) -> CreditLedger {
    ledger_with(db, db.db_arc(), Arc::new(DisabledRecharger))
}

struct FailingAudit;

#[async_trait]
impl AuditSink for FailingAudit {
    async fn record_call(&self, _entry: &CallLogEntry) -> Result<()> {
        Err(GatewayError::internal("audit table unavailable"))
    }
}

/// Succeeds after a pause, counting charges
#[derive(Default)]
struct SlowRecharger {
    charges: AtomicUsize,
}

#[async_trait]
impl Recharger for SlowRecharger {
    async fn charge(&self, account: &UserAccount) -> std::result::Result<RechargeReceipt, RechargeError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.charges.fetch_add(1, Ordering::SeqCst);
        Ok(RechargeReceipt {
            payment_intent_id: format!("pi_{}", account.id.simple()),
            amount_cents: account.auto_recharge.price_cents,
        })
    }
}

struct DecliningRecharger;

#[async_trait]
impl Recharger for DecliningRecharger {
    async fn charge(&self, _account: &UserAccount) -> std::result::Result<RechargeReceipt, RechargeError> {
        Err(RechargeError::Declined("card_declined".into()))
    }
}

#[tokio::test]
async fn test_settle_deducts_and_audits() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(1_000)).await;

    let meta = ledger(&db).settle(&account, sonnet_call(&account)).await;

    assert_eq!(meta.cost_units, SONNET_CALL_UNITS);
    assert_eq!(meta.credits, 700);
    assert_eq!(db.credits(account.id).await, 700);

    let calls = db.db().recent_api_calls(account.id, 10).await.unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].status, "success");
    assert_eq!(calls[0].cost_units, SONNET_CALL_UNITS);
    assert_eq!(calls[0].input_tokens, 10_000);
}

#[tokio::test]
async fn test_concurrent_settlements_never_overdraw() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(1_000)).await;
    let ledger = ledger(&db);

    let settlements = (0..12).map(|_| {
        let ledger = ledger.clone();
        let account = account.clone();
        tokio::spawn(async move { ledger.settle(&account, sonnet_call(&account)).await })
    });
    for handle in futures::future::join_all(settlements).await {
        handle.unwrap();
    }

    // Three 300-unit calls fit in 1000; the rest are refused
    assert_eq!(db.credits(account.id).await, 100);

    let calls = db.db().recent_api_calls(account.id, 100).await.unwrap();
    assert_eq!(calls.len(), 12);
    assert_eq!(calls.iter().filter(|c| c.status == "success").count(), 3);
    assert_eq!(calls.iter().filter(|c| c.status == "unpaid").count(), 9);
}

#[tokio::test]
async fn test_unpaid_calls_excluded_from_monthly_credits() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(400)).await;
    let ledger = ledger(&db);

    ledger.settle(&account, sonnet_call(&account)).await;
    ledger.settle(&account, sonnet_call(&account)).await;

    let usage = db.db().monthly_usage(account.id, Utc::now()).await.unwrap();
    assert_eq!(usage.total_calls, 2);
    assert_eq!(usage.total_cost_units, SONNET_CALL_UNITS);
    assert_eq!(usage.month, Utc::now().format("%Y-%m").to_string());
}

#[tokio::test]
async fn test_audit_failure_does_not_undo_deduction() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(1_000)).await;
    let ledger = ledger_with(&db, Arc::new(FailingAudit), Arc::new(DisabledRecharger));

    let meta = ledger.settle(&account, sonnet_call(&account)).await;

    assert_eq!(meta.credits, 700);
    assert_eq!(db.credits(account.id).await, 700);
    assert!(db.db().recent_api_calls(account.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failure_is_audited_without_charge() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(1_000)).await;

    let entry = CallLogEntry::failure(
        account.id,
        ProviderKind::OpenAI,
        "gpt-5-mini",
        12,
        "Upstream provider error",
    );
    ledger(&db).record_failure(entry).await;

    assert_eq!(db.credits(account.id).await, 1_000);
    let calls = db.db().recent_api_calls(account.id, 10).await.unwrap();
    assert_eq!(calls[0].status, "error");
    assert_eq!(calls[0].cost_units, 0);
    assert_eq!(calls[0].error_message.as_deref(), Some("Upstream provider error"));
}

#[tokio::test]
async fn test_precheck_refuses_depleted_trial() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::free(0)).await;

    let err = ledger(&db).precheck(&account).await.unwrap_err();
    assert!(matches!(err, GatewayError::InsufficientBalance(ref m) if m == MSG_TRIAL_DEPLETED));
}

#[tokio::test]
async fn test_precheck_recharges_pro_account() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::pro_with_auto_recharge(0)).await;
    let recharger = Arc::new(SlowRecharger::default());
    let ledger = ledger_with(&db, db.db_arc(), recharger.clone());

    ledger.precheck(&account).await.unwrap();

    assert_eq!(recharger.charges.load(Ordering::SeqCst), 1);
    assert_eq!(db.credits(account.id).await, account.auto_recharge.credits);
}

#[tokio::test]
async fn test_precheck_reports_failed_recharge() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::pro_with_auto_recharge(0)).await;
    let ledger = ledger_with(&db, db.db_arc(), Arc::new(DecliningRecharger));

    let err = ledger.precheck(&account).await.unwrap_err();
    assert!(matches!(err, GatewayError::InsufficientBalance(ref m) if m == MSG_RECHARGE_FAILED));
    assert_eq!(db.credits(account.id).await, 0);
}

#[tokio::test]
async fn test_overlapping_recharges_charge_once() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::pro_with_auto_recharge(0)).await;
    let recharger = Arc::new(SlowRecharger::default());
    let ledger = ledger_with(&db, db.db_arc(), recharger.clone());

    let (first, second) = tokio::join!(ledger.recharge(&account), ledger.recharge(&account));

    assert_eq!(first.unwrap(), account.auto_recharge.credits);
    assert!(matches!(second, Err(RechargeError::InProgress)));
    assert_eq!(recharger.charges.load(Ordering::SeqCst), 1);

    // The claim is released once the first recharge finishes
    ledger.recharge(&account).await.unwrap();
    assert_eq!(recharger.charges.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_settlement_under_threshold_triggers_background_recharge() {
    let db = TestDatabase::new().await;
    let account = db.insert(AccountFactory::pro_with_auto_recharge(10_200)).await;
    let recharger = Arc::new(SlowRecharger::default());
    let ledger = ledger_with(&db, db.db_arc(), recharger.clone());

    let meta = ledger.settle(&account, sonnet_call(&account)).await;
    assert_eq!(meta.credits, 9_900);

    for _ in 0..50 {
        if recharger.charges.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    // Let the credit write land after the charge
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recharger.charges.load(Ordering::SeqCst), 1);
    assert_eq!(db.credits(account.id).await, 9_900 + account.auto_recharge.credits);
}
