//! Test fixtures and data factories
//!
//! All factories create real objects, not mocks.

use creditgate::auth::JwtHandler;
use creditgate::config::{Config, ProviderConfig};
use creditgate::core::billing::{Plan, UserAccount};
use creditgate::core::providers::ProviderKind;
use serde_json::{Value, json};
use uuid::Uuid;

/// Signing secret shared by test configs and test tokens
pub const TEST_JWT_SECRET: &str = "creditgate-integration-secret-0123456789";

/// Factory for test accounts
pub struct AccountFactory;

impl AccountFactory {
    fn base(credits: i64) -> UserAccount {
        let mut account = UserAccount::new(format!("test-{}@example.com", &Uuid::new_v4().simple().to_string()[..8]));
        account.credits = credits;
        account
    }

    /// Free-trial account with the given balance
    pub fn free(credits: i64) -> UserAccount {
        Self::base(credits)
    }

    /// Pro account with the given balance and no auto-recharge
    pub fn pro(credits: i64) -> UserAccount {
        let mut account = Self::base(credits);
        account.plan = Plan::Pro;
        account
    }

    /// Pro account with auto-recharge on and a card customer attached
    pub fn pro_with_auto_recharge(credits: i64) -> UserAccount {
        let mut account = Self::pro(credits);
        account.auto_recharge.enabled = true;
        account.stripe_customer_id = Some("cus_test".to_string());
        account
    }

    /// Suspended account with a healthy balance
    pub fn suspended() -> UserAccount {
        let mut account = Self::base(50_000);
        account.suspended = true;
        account
    }
}

/// Config with every upstream pointed at `upstream_base`
pub fn test_config(upstream_base: &str) -> Config {
    let mut config = Config::default();
    config.gateway.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.gateway.billing.surcharge_multiplier = 1.0;
    config.gateway.providers = ProviderKind::ALL
        .into_iter()
        .map(|kind| {
            let mut provider = ProviderConfig::new(kind);
            provider.api_key = Some(format!("{}-test-key", kind));
            provider.base_url = Some(upstream_base.to_string());
            provider
        })
        .collect();
    config
}

/// Config where `kind` has no API key
pub fn config_without(upstream_base: &str, kind: ProviderKind) -> Config {
    let mut config = test_config(upstream_base);
    config.gateway.providers.retain(|p| p.provider_type != kind);
    config
}

/// `Authorization` header value for an account
pub fn bearer(config: &Config, account: &UserAccount) -> String {
    let token = JwtHandler::new(config.auth())
        .create_token(account.id, Some(account.email.clone()))
        .expect("Failed to sign test token");
    format!("Bearer {}", token)
}

/// Minimal canonical request body
pub fn chat_request(model: &str, stream: bool) -> Value {
    json!({
        "model": model,
        "max_tokens": 256,
        "stream": stream,
        "messages": [{"role": "user", "content": "What is the weather in Oslo?"}],
        "tools": [{
            "name": "get_weather",
            "description": "Current weather for a city",
            "input_schema": {"type": "object", "properties": {"city": {"type": "string"}}}
        }]
    })
}
