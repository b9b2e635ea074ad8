//! Authentication
//!
//! Bearer JWTs are verified, then resolved to a live account. Suspended
//! accounts are refused.

pub mod extractor;
pub mod jwt;

pub use extractor::AuthenticatedUser;
pub use jwt::JwtHandler;

use crate::config::AuthConfig;
use crate::core::billing::{AccountStore, UserAccount};
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Resolves bearer credentials to accounts
#[derive(Clone)]
pub struct AuthGateway {
    jwt: Arc<JwtHandler>,
    store: Arc<dyn AccountStore>,
    activity_debounce: Duration,
}

impl AuthGateway {
    pub fn new(config: &AuthConfig, store: Arc<dyn AccountStore>) -> Self {
        Self {
            jwt: Arc::new(JwtHandler::new(config)),
            store,
            activity_debounce: Duration::from_secs(config.activity_debounce),
        }
    }

    pub fn jwt(&self) -> &JwtHandler {
        &self.jwt
    }

    /// Authenticate an `Authorization` header value
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<UserAccount> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| GatewayError::auth("Authentication required"))?;

        let user_id = self
            .jwt
            .verify_user_id(token)
            .map_err(|_| GatewayError::auth("Invalid or expired token"))?;

        let account = self
            .store
            .find_account(user_id)
            .await?
            .ok_or_else(|| GatewayError::auth("User not found"))?;

        if account.suspended {
            debug!(user_id = %account.id, "Rejected suspended account");
            return Err(GatewayError::forbidden("Account suspended"));
        }

        self.touch(&account).await;
        Ok(account)
    }

    /// Stamp activity at most once per debounce interval
    async fn touch(&self, account: &UserAccount) {
        let debounce = chrono::Duration::from_std(self.activity_debounce)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let stale_before = Utc::now() - debounce;
        if account.last_active_at.is_some_and(|at| at >= stale_before) {
            return;
        }
        if let Err(e) = self.store.touch_last_active(account.id, stale_before).await {
            warn!(user_id = %account.id, error = %e, "Failed to update last activity");
        }
    }
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("jwt", &self.jwt)
            .field("activity_debounce", &self.activity_debounce)
            .finish()
    }
}
