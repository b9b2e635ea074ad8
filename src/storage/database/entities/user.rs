use crate::core::billing::{AutoRecharge, Plan, UserAccount};
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Email address (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Subscription plan (`free` or `pro`)
    pub plan: String,

    /// Balance in cost units
    pub credits: i64,

    /// Suspended accounts are refused at authentication
    pub suspended: bool,

    /// Stripe customer used for off-session charges
    pub stripe_customer_id: Option<String>,

    pub auto_recharge_enabled: bool,
    pub auto_recharge_threshold: i64,
    pub auto_recharge_credits: i64,
    pub auto_recharge_price_cents: i64,

    /// Last authenticated request, debounced
    pub last_active_at: Option<DateTimeWithTimeZone>,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Last update timestamp
    pub updated_at: DateTimeWithTimeZone,
}

/// User entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::api_call::Entity")]
    ApiCalls,
}

impl Related<super::api_call::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiCalls.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert to the billing account view
    pub fn to_account(&self) -> UserAccount {
        UserAccount {
            id: self.id,
            email: self.email.clone(),
            plan: self.plan.parse().unwrap_or(Plan::Free),
            credits: self.credits,
            suspended: self.suspended,
            stripe_customer_id: self.stripe_customer_id.clone(),
            auto_recharge: AutoRecharge {
                enabled: self.auto_recharge_enabled,
                threshold: self.auto_recharge_threshold,
                credits: self.auto_recharge_credits,
                price_cents: self.auto_recharge_price_cents,
            },
            last_active_at: self.last_active_at.map(|t| t.with_timezone(&chrono::Utc)),
            created_at: self.created_at.with_timezone(&chrono::Utc),
        }
    }

    /// Active model for inserting a new account
    pub fn from_account(account: &UserAccount) -> ActiveModel {
        let now = chrono::Utc::now();
        ActiveModel {
            id: Set(account.id),
            email: Set(account.email.clone()),
            plan: Set(account.plan.as_str().to_string()),
            credits: Set(account.credits),
            suspended: Set(account.suspended),
            stripe_customer_id: Set(account.stripe_customer_id.clone()),
            auto_recharge_enabled: Set(account.auto_recharge.enabled),
            auto_recharge_threshold: Set(account.auto_recharge.threshold),
            auto_recharge_credits: Set(account.auto_recharge.credits),
            auto_recharge_price_cents: Set(account.auto_recharge.price_cents),
            last_active_at: Set(account.last_active_at.map(Into::into)),
            created_at: Set(account.created_at.into()),
            updated_at: Set(now.into()),
        }
    }
}
