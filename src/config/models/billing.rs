//! Billing configuration
//!
//! Credit amounts are integer cost units (hundredths of a cent).

use crate::core::cost::{DEFAULT_SURCHARGE, PricingEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pricing and credit settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Multiplier applied on top of upstream list prices
    #[serde(default = "default_surcharge")]
    pub surcharge_multiplier: f64,
    /// Per-model rate overrides, USD per million tokens
    #[serde(default)]
    pub pricing: HashMap<String, PricingEntry>,
    /// Auto-recharge settings
    #[serde(default)]
    pub recharge: RechargeConfig,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            surcharge_multiplier: default_surcharge(),
            pricing: HashMap::new(),
            recharge: RechargeConfig::default(),
        }
    }
}

impl BillingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.surcharge_multiplier.is_finite() || self.surcharge_multiplier <= 0.0 {
            return Err(format!(
                "Surcharge multiplier must be positive, got {}",
                self.surcharge_multiplier
            ));
        }
        for (model, entry) in &self.pricing {
            entry
                .validate()
                .map_err(|e| format!("Pricing for {}: {}", model, e))?;
        }
        self.recharge.validate()
    }
}

/// Stripe-backed auto-recharge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RechargeConfig {
    /// Stripe secret key; recharging is disabled without one
    #[serde(default)]
    pub stripe_secret_key: Option<String>,
    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Request timeout for Stripe calls in seconds
    #[serde(default = "default_stripe_timeout")]
    pub timeout: u64,
}

impl Default for RechargeConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            stripe_api_base: default_stripe_api_base(),
            currency: default_currency(),
            timeout: default_stripe_timeout(),
        }
    }
}

impl RechargeConfig {
    pub fn is_enabled(&self) -> bool {
        self.stripe_secret_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_enabled() {
            url::Url::parse(&self.stripe_api_base)
                .map_err(|e| format!("Stripe API base is invalid: {}", e))?;
        }
        Ok(())
    }
}

fn default_surcharge() -> f64 {
    DEFAULT_SURCHARGE
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_stripe_timeout() -> u64 {
    30
}
