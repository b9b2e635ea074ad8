//! Off-session card top-ups
//!
//! A recharge charges the customer's saved card through Stripe and, only
//! once the PaymentIntent has succeeded, adds the configured credits.

use super::types::UserAccount;
use crate::config::RechargeConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Recharge failures
#[derive(Debug, Error)]
pub enum RechargeError {
    #[error("Auto-recharge is not available on this server")]
    Disabled,

    #[error("No Stripe customer on file")]
    NoCustomer,

    #[error("No card payment method on file")]
    NoPaymentMethod,

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to credit account: {0}")]
    Storage(String),

    #[error("A recharge is already in progress")]
    InProgress,
}

/// Proof of a successful charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RechargeReceipt {
    pub payment_intent_id: String,
    pub amount_cents: i64,
}

/// Charges a user's saved payment method
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Recharger: Send + Sync {
    async fn charge(&self, account: &UserAccount) -> Result<RechargeReceipt, RechargeError>;
}

/// Used when no payment provider is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRecharger;

#[async_trait]
impl Recharger for DisabledRecharger {
    async fn charge(&self, _account: &UserAccount) -> Result<RechargeReceipt, RechargeError> {
        Err(RechargeError::Disabled)
    }
}

#[derive(Debug, Deserialize)]
struct PaymentMethodList {
    #[serde(default)]
    data: Vec<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethod {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Stripe REST client for off-session PaymentIntents
#[derive(Debug, Clone)]
pub struct StripeRecharger {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
    currency: String,
}

impl StripeRecharger {
    pub fn new(secret_key: impl Into<String>, config: &RechargeConfig) -> Result<Self, RechargeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            secret_key: secret_key.into(),
            api_base: config.stripe_api_base.trim_end_matches('/').to_string(),
            currency: config.currency.clone(),
        })
    }

    async fn first_card(&self, customer: &str) -> Result<String, RechargeError> {
        let response = self
            .client
            .get(format!("{}/v1/payment_methods", self.api_base))
            .bearer_auth(&self.secret_key)
            .query(&[("customer", customer), ("type", "card")])
            .send()
            .await?;
        let response = check_status(response).await?;
        let methods: PaymentMethodList = response.json().await?;
        methods
            .data
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or(RechargeError::NoPaymentMethod)
    }
}

#[async_trait]
impl Recharger for StripeRecharger {
    async fn charge(&self, account: &UserAccount) -> Result<RechargeReceipt, RechargeError> {
        let customer = account
            .stripe_customer_id
            .as_deref()
            .ok_or(RechargeError::NoCustomer)?;
        let payment_method = self.first_card(customer).await?;
        let amount = account.auto_recharge.price_cents;
        let amount_param = amount.to_string();
        let user_id = account.id.to_string();

        debug!(user_id = %account.id, amount_cents = amount, "Creating off-session PaymentIntent");
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&[
                ("amount", amount_param.as_str()),
                ("currency", self.currency.as_str()),
                ("customer", customer),
                ("payment_method", payment_method.as_str()),
                ("off_session", "true"),
                ("confirm", "true"),
                ("metadata[user_id]", user_id.as_str()),
                ("metadata[type]", "auto_recharge"),
            ])
            .send()
            .await?;
        let response = check_status(response).await?;
        let intent: PaymentIntent = response.json().await?;

        if intent.status != "succeeded" {
            warn!(user_id = %account.id, status = %intent.status, "PaymentIntent did not succeed");
            return Err(RechargeError::Declined(format!(
                "payment status {}",
                intent.status
            )));
        }

        info!(user_id = %account.id, payment_intent = %intent.id, "Auto-recharge charged");
        Ok(RechargeReceipt {
            payment_intent_id: intent.id,
            amount_cents: amount,
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RechargeError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<StripeErrorBody>(&text)
        .ok()
        .and_then(|body| body.error.message.or(body.error.code))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    Err(RechargeError::Declined(detail))
}
