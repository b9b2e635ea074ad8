use crate::core::billing::{AccountStore, UserAccount};
use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::debug;
use uuid::Uuid;

use super::super::entities::{self, user};
use super::types::SeaOrmDatabase;

impl SeaOrmDatabase {
    /// Find user by ID
    pub async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        debug!("Finding user by ID: {}", user_id);

        let user_model = entities::User::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(user_model.map(|model| model.to_account()))
    }

    /// Find user by email
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        debug!("Finding user by email: {}", email);

        let user_model = entities::User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(user_model.map(|model| model.to_account()))
    }

    /// Create a new user
    pub async fn create_user(&self, account: &UserAccount) -> Result<UserAccount> {
        debug!("Creating user: {}", account.email);

        entities::User::insert(user::Model::from_account(account))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(account.clone())
    }

    /// Current balance in cost units
    pub async fn get_credits(&self, user_id: Uuid) -> Result<Option<i64>> {
        entities::User::find_by_id(user_id)
            .select_only()
            .column(user::Column::Credits)
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)
    }

    /// Subtract `amount` only if the balance covers it.
    /// Returns whether a row was updated.
    pub async fn deduct_credits(&self, user_id: Uuid, amount: i64) -> Result<bool> {
        debug!("Deducting {} units from user: {}", amount, user_id);

        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = entities::User::update_many()
            .col_expr(
                user::Column::Credits,
                Expr::col(user::Column::Credits).sub(amount),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::Credits.gte(amount))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(result.rows_affected > 0)
    }

    /// Add `amount` and return the new balance, `None` for an unknown user
    pub async fn add_credits(&self, user_id: Uuid, amount: i64) -> Result<Option<i64>> {
        debug!("Adding {} units to user: {}", amount, user_id);

        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = entities::User::update_many()
            .col_expr(
                user::Column::Credits,
                Expr::col(user::Column::Credits).add(amount),
            )
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_credits(user_id).await
    }

    /// Stamp `last_active_at` unless it is newer than `stale_before`
    pub async fn touch_last_active(
        &self,
        user_id: Uuid,
        stale_before: DateTime<Utc>,
    ) -> Result<bool> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let cutoff: DateTimeWithTimeZone = stale_before.into();
        let result = entities::User::update_many()
            .col_expr(user::Column::LastActiveAt, Expr::value(now))
            .filter(user::Column::Id.eq(user_id))
            .filter(
                Condition::any()
                    .add(user::Column::LastActiveAt.is_null())
                    .add(user::Column::LastActiveAt.lt(cutoff)),
            )
            .exec(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(result.rows_affected > 0)
    }

    /// Change a user's plan and auto-recharge settings
    pub async fn update_billing_profile(&self, account: &UserAccount) -> Result<()> {
        debug!("Updating billing profile for user: {}", account.id);

        let mut active_model: user::ActiveModel = entities::User::find_by_id(account.id)
            .one(&self.db)
            .await
            .map_err(GatewayError::Database)?
            .ok_or_else(|| GatewayError::NotFound("User not found".to_string()))?
            .into();

        active_model.plan = Set(account.plan.as_str().to_string());
        active_model.suspended = Set(account.suspended);
        active_model.stripe_customer_id = Set(account.stripe_customer_id.clone());
        active_model.auto_recharge_enabled = Set(account.auto_recharge.enabled);
        active_model.auto_recharge_threshold = Set(account.auto_recharge.threshold);
        active_model.auto_recharge_credits = Set(account.auto_recharge.credits);
        active_model.auto_recharge_price_cents = Set(account.auto_recharge.price_cents);
        active_model.updated_at = Set(Utc::now().into());

        active_model
            .update(&self.db)
            .await
            .map_err(GatewayError::Database)?;

        Ok(())
    }
}

#[async_trait]
impl AccountStore for SeaOrmDatabase {
    async fn find_account(&self, user_id: Uuid) -> Result<Option<UserAccount>> {
        self.find_user_by_id(user_id).await
    }

    async fn deduct_credits(&self, user_id: Uuid, amount: i64) -> Result<bool> {
        SeaOrmDatabase::deduct_credits(self, user_id, amount).await
    }

    async fn add_credits(&self, user_id: Uuid, amount: i64) -> Result<Option<i64>> {
        SeaOrmDatabase::add_credits(self, user_id, amount).await
    }

    async fn touch_last_active(&self, user_id: Uuid, stale_before: DateTime<Utc>) -> Result<bool> {
        SeaOrmDatabase::touch_last_active(self, user_id, stale_before).await
    }
}
