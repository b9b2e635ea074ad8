//! Account status and usage endpoints

use crate::auth::AuthenticatedUser;
use crate::core::billing::AutoRecharge;
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub user: UserSummary,
    pub plan: &'static str,
    pub credits: i64,
    pub suspended: bool,
    pub stripe_customer_id: Option<String>,
    pub auto_recharge: AutoRechargeSummary,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRechargeSummary {
    pub enabled: bool,
    pub threshold: i64,
    pub credits: i64,
    pub price_cents: i64,
}

impl From<&AutoRecharge> for AutoRechargeSummary {
    fn from(settings: &AutoRecharge) -> Self {
        Self {
            enabled: settings.enabled,
            threshold: settings.threshold,
            credits: settings.credits,
            price_cents: settings.price_cents,
        }
    }
}

/// Calls and credits spent in the current calendar month
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub month: String,
    pub total_calls: u64,
    pub total_credits: i64,
}

/// GET /api/v1/auth/status
pub async fn status(user: AuthenticatedUser) -> HttpResponse {
    let account = user.into_inner();
    HttpResponse::Ok().json(StatusResponse {
        user: UserSummary {
            email: account.email.clone(),
        },
        plan: account.plan.as_str(),
        credits: account.credits,
        suspended: account.suspended,
        stripe_customer_id: account.stripe_customer_id.clone(),
        auto_recharge: AutoRechargeSummary::from(&account.auto_recharge),
    })
}

/// GET /api/v1/auth/usage
pub async fn usage(state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
    let usage = state
        .storage
        .database
        .monthly_usage(user.id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(UsageResponse {
        month: usage.month,
        total_calls: usage.total_calls,
        total_credits: usage.total_cost_units,
    }))
}
